use crate::assemble::{Placement, copy_tree, placement};
use crate::error::{BuildError, Result};
use crate::render::render_file;
use crate::templates::{DATA_JS, PAGE, THEME_JS};
use dashboard_config::{
    ChartOptions, ChartTheme, IndexScope, MetaData, StaticMetaData, ThemeError, builtin_theme,
    parse_theme,
};
use include_dir::{Dir, DirEntry};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct DataContext {
    regions: String,
}

#[derive(Serialize)]
struct ThemeContext {
    theme: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThemeValue<'a> {
    options: &'a ChartOptions,
    colors: &'a [String],
    dataset_override: &'a [serde_json::Value],
}

/// Resolve `--theme`/`[page] theme`: a built-in name or a theme file under `root`.
pub fn load_theme(name: &str, root: &Path) -> Result<ChartTheme> {
    match builtin_theme(name) {
        Ok(theme) => Ok(theme),
        Err(ThemeError::Unknown(_)) => {
            let path = root.join(name);
            let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    BuildError::config(format!("unknown theme `{name}`"))
                }
                _ => BuildError::io(&path, e),
            })?;
            parse_theme(&content)
                .map_err(|e| BuildError::config(format!("{}: {e}", path.display())))
        }
        Err(e) => Err(BuildError::config(e.to_string())),
    }
}

/// Put the dashboard page into the build bundle so it ships with the libraries.
///
/// The skeleton only fills in missing files and `data.js` starts out empty;
/// `theme.js` always follows the configured theme.
pub fn stage_page(bundle: &Path, theme: &ChartTheme) -> Result<()> {
    write_page(&PAGE, bundle, false)?;
    write_theme(bundle, theme)?;
    let data = bundle.join("data.js");
    if !data.exists() {
        write_regions(bundle, &StaticMetaData::new(serde_json::json!({})))?;
    }
    info!("Staged dashboard page in {}", bundle.display());
    Ok(())
}

/// Write a self-contained dashboard into `out`.
///
/// The page skeleton is written first (existing files kept unless `force`),
/// then the collected bundle from `bundle` is overlaid when present, then the
/// regions and chart theme scripts are always regenerated.
pub fn write_dashboard(
    out: &Path,
    bundle: &Path,
    meta: &dyn MetaData,
    theme: &ChartTheme,
    force: bool,
) -> Result<()> {
    if out.exists() && !out.is_dir() {
        return Err(BuildError::config(format!(
            "output directory already exists and is not a directory: {}",
            out.display()
        )));
    }
    let overlay = if bundle.is_dir() {
        Some(placement(bundle, out)?)
    } else {
        None
    };
    if overlay == Some(Placement::Inside) {
        return Err(BuildError::config(format!(
            "output directory {} is inside the bundle {}",
            out.display(),
            bundle.display()
        )));
    }
    fs::create_dir_all(out).map_err(|e| BuildError::unwritable(out, e))?;

    write_page(&PAGE, out, force)?;

    match overlay {
        Some(Placement::Apart) => {
            let copied = copy_tree(bundle, out)?;
            info!("Copied {} bundle files from {}", copied, bundle.display());
        }
        Some(_) => debug!("Writing into the bundle itself, no overlay"),
        None => warn!(
            "Bundle {} not found, run the `copy` task first for chart libraries",
            bundle.display()
        ),
    }

    write_regions(out, meta)?;
    write_theme(out, theme)?;
    info!("Dashboard written to {} using theme '{}'", out.display(), theme.name);
    Ok(())
}

fn write_regions(out: &Path, meta: &dyn MetaData) -> Result<()> {
    let regions = to_json(meta.regions())?;
    render_file(&out.join("data.js"), DATA_JS, &DataContext { regions }, true)?;
    Ok(())
}

fn write_theme(out: &Path, theme: &ChartTheme) -> Result<()> {
    let meta = StaticMetaData::default();
    let scope = IndexScope::init(&meta, theme);
    let theme_json = to_json(&ThemeValue {
        options: scope.options,
        colors: scope.colors,
        dataset_override: scope.dataset_override,
    })?;
    render_file(
        &out.join("theme.js"),
        THEME_JS,
        &ThemeContext { theme: theme_json },
        true,
    )?;
    Ok(())
}

fn write_page(dir: &Dir<'_>, out: &Path, force: bool) -> Result<()> {
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(sub) => write_page(sub, out, force)?,
            DirEntry::File(file) => {
                let path = out.join(file.path());
                if path.exists() && !force {
                    debug!("Keep existing {}", path.display());
                    continue;
                }
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| BuildError::unwritable(parent, e))?;
                }
                fs::write(&path, file.contents()).map_err(|e| BuildError::unwritable(&path, e))?;
            }
        }
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| BuildError::config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn writes_page_data_and_theme() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("site");
        let meta = StaticMetaData::new(json!({ "east": { "url": "http://east/MAAS/" } }));
        let theme = builtin_theme("status").unwrap();

        write_dashboard(&out, &dir.path().join("missing"), &meta, &theme, false).unwrap();

        assert!(out.join("index.html").is_file());
        assert!(out.join("libs/meta_maas.js").is_file());
        let data = fs::read_to_string(out.join("data.js")).unwrap();
        assert!(data.contains(r#"this.regions = {"east":{"url":"http://east/MAAS/"}};"#));
        let theme_js = fs::read_to_string(out.join("theme.js")).unwrap();
        assert!(theme_js.starts_with("angular.module('meta-maas').constant('chartTheme', {"));
        assert!(theme_js.contains(r#""cutoutPercentage":95"#));
        assert!(theme_js.contains(r#""datasetOverride":[{"cutoutPercentage":90}]"#));
    }

    #[test]
    fn overlays_bundle_and_keeps_custom_page() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("site");
        let bundle = dir.path().join("html");
        fs::create_dir_all(bundle.join("libs")).unwrap();
        fs::write(bundle.join("libs/angular.min.js"), "angular").unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("index.html"), "custom").unwrap();

        let meta = StaticMetaData::default();
        let theme = builtin_theme("compact").unwrap();
        write_dashboard(&out, &bundle, &meta, &theme, false).unwrap();

        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "custom");
        assert!(out.join("libs/angular.min.js").is_file());
        assert!(fs::read_to_string(out.join("data.js")).unwrap().contains("this.regions = null;"));
    }

    #[test]
    fn rejects_file_as_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("site");
        fs::write(&out, "not a dir").unwrap();
        let theme = builtin_theme("status").unwrap();
        let err = write_dashboard(&out, dir.path(), &StaticMetaData::default(), &theme, false)
            .unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    fn seed_bundle(root: &Path) -> std::path::PathBuf {
        let bundle = root.join("html");
        fs::create_dir_all(bundle.join("libs")).unwrap();
        fs::write(bundle.join("libs/Chart.bundle.min.js"), "chart library bytes").unwrap();
        bundle
    }

    #[test]
    fn writing_into_the_bundle_keeps_libraries() {
        let dir = tempdir().unwrap();
        let bundle = seed_bundle(dir.path());
        let theme = builtin_theme("status").unwrap();

        write_dashboard(&bundle, &bundle, &StaticMetaData::default(), &theme, false).unwrap();

        assert_eq!(
            fs::read_to_string(bundle.join("libs/Chart.bundle.min.js")).unwrap(),
            "chart library bytes"
        );
        assert!(bundle.join("index.html").is_file());
        assert!(bundle.join("data.js").is_file());
    }

    #[test]
    fn output_inside_bundle_is_rejected() {
        let dir = tempdir().unwrap();
        let bundle = seed_bundle(dir.path());
        let out = bundle.join("site");
        let theme = builtin_theme("status").unwrap();

        let err = write_dashboard(&out, &bundle, &StaticMetaData::default(), &theme, false)
            .unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
        assert!(!out.exists());
    }

    #[test]
    fn staged_page_keeps_existing_regions() {
        let dir = tempdir().unwrap();
        let bundle = seed_bundle(dir.path());
        let theme = builtin_theme("compact").unwrap();

        stage_page(&bundle, &theme).unwrap();
        assert!(bundle.join("index.html").is_file());
        assert!(bundle.join("libs/meta_maas.js").is_file());
        let theme_js = fs::read_to_string(bundle.join("theme.js")).unwrap();
        assert!(theme_js.contains(r#""cutoutPercentage":80"#));
        let data_js = fs::read_to_string(bundle.join("data.js")).unwrap();
        assert!(data_js.contains("this.regions = {};"));

        fs::write(bundle.join("data.js"), "live data").unwrap();
        stage_page(&bundle, &theme).unwrap();
        assert_eq!(fs::read_to_string(bundle.join("data.js")).unwrap(), "live data");
    }

    #[test]
    fn loads_theme_files_relative_to_root() {
        let dir = tempdir().unwrap();
        let theme = "name = \"mine\"\ncolors = [\"#000\"]\n";
        fs::write(dir.path().join("mine.toml"), theme).unwrap();
        assert_eq!(load_theme("mine.toml", dir.path()).unwrap().name, "mine");
        assert_eq!(load_theme("status", dir.path()).unwrap().name, "status");

        let err = load_theme("neon", dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "config error: unknown theme `neon`");
    }
}
