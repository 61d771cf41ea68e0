pub const DATA_JS: &str = include_str!("templates/data.js.tmpl");
pub const THEME_JS: &str = include_str!("templates/theme.js.tmpl");

pub static PAGE: include_dir::Dir<'_> =
    include_dir::include_dir!("$CARGO_MANIFEST_DIR/src/templates/page");
