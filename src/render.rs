use crate::error::{BuildError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tinytemplate::TinyTemplate;
use tracing::{info, warn};

/// Render `template` with `ctx` into `path`.
///
/// Existing files are kept unless `force` is set. Returns whether the file
/// was written. Substitutions are inserted verbatim, not HTML-escaped.
pub fn render_file<T: Serialize>(
    path: &Path,
    template: &str,
    ctx: &T,
    force: bool,
) -> Result<bool> {
    if path.exists() && !force {
        warn!("Skip existing {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::unwritable(parent, e))?;
    }

    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("tpl", template)
        .map_err(|e| BuildError::config(format!("bad template for {}: {e}", path.display())))?;

    // 渲染模板
    let content = tt
        .render("tpl", ctx)
        .map_err(|e| BuildError::config(format!("cannot render {}: {e}", path.display())))?;

    fs::write(path, content).map_err(|e| BuildError::unwritable(path, e))?;
    info!("Generated {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Ctx {
        value: String,
    }

    #[test]
    fn renders_without_escaping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.js");
        let ctx = Ctx {
            value: r#"{"a":"<b>"}"#.into(),
        };
        assert!(render_file(&path, "var x = {value};", &ctx, false).unwrap());
        assert_eq!(fs::read_to_string(path).unwrap(), r#"var x = {"a":"<b>"};"#);
    }

    #[test]
    fn keeps_existing_unless_forced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.js");
        fs::write(&path, "mine").unwrap();
        let ctx = Ctx { value: "1".into() };

        assert!(!render_file(&path, "{value}", &ctx, false).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "mine");

        assert!(render_file(&path, "{value}", &ctx, true).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "1");
    }
}
