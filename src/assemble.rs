use crate::error::{BuildError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a copy destination sits relative to its source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Same,
    Inside,
    Apart,
}

/// Compare `to` against the existing directory `from` without creating anything.
///
/// Symlinks are resolved through the deepest ancestor of `to` that exists.
pub fn placement(from: &Path, to: &Path) -> Result<Placement> {
    let from = from.canonicalize().map_err(|e| BuildError::io(from, e))?;
    let to = resolve(to)?;
    Ok(if to == from {
        Placement::Same
    } else if to.starts_with(&from) {
        Placement::Inside
    } else {
        Placement::Apart
    })
}

fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| BuildError::io(path, e))?;
    let mut rest = Vec::new();
    let mut existing = absolute.as_path();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_owned());
                existing = parent;
            }
            _ => break,
        }
    }
    let mut resolved = existing
        .canonicalize()
        .map_err(|e| BuildError::io(existing, e))?;
    resolved.extend(rest.iter().rev());
    Ok(resolved)
}

/// Stage the bundle tree under `root` into `install_dir`.
///
/// The install dir is passed in explicitly and checked here rather than read
/// from the environment. Returns the number of files copied.
pub fn assemble(bundle: &Path, root: &Path, install_dir: Option<&Path>) -> Result<usize> {
    let install_dir = install_dir.ok_or(BuildError::MissingInstallDir)?;
    let source = root.join(bundle);
    if !source.is_dir() {
        return Err(BuildError::MissingSource(source));
    }

    match placement(&source, install_dir)? {
        Placement::Same => {
            info!("Install dir is the bundle itself, nothing to copy");
            return Ok(0);
        }
        Placement::Inside => {
            return Err(BuildError::config(format!(
                "install dir {} is inside the bundle {}",
                install_dir.display(),
                source.display()
            )));
        }
        Placement::Apart => {}
    }

    fs::create_dir_all(install_dir).map_err(|e| BuildError::unwritable(install_dir, e))?;
    let copied = copy_tree(&source, install_dir)?;
    info!("Installed {} files into {}", copied, install_dir.display());
    Ok(copied)
}

/// Recursively copy `from` into `to`, overwriting existing files.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    fs::create_dir_all(to).map_err(|e| BuildError::unwritable(to, e))?;
    let mut copied = 0;
    let entries = fs::read_dir(from).map_err(|e| BuildError::io(from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(from, e))?;
        let path = entry.path();
        let target = to.join(entry.file_name());
        if path.is_dir() {
            copied += copy_tree(&path, &target)?;
        } else {
            fs::copy(&path, &target).map_err(|e| BuildError::unwritable(&target, e))?;
            debug!("Copied {}", target.display());
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seed_bundle(root: &Path) {
        fs::create_dir_all(root.join("html/libs")).unwrap();
        fs::write(root.join("html/index.html"), "<html></html>").unwrap();
        fs::write(root.join("html/libs/angular.min.js"), "angular").unwrap();
    }

    #[test]
    fn copies_whole_tree() {
        let dir = tempdir().unwrap();
        let install = tempdir().unwrap();
        seed_bundle(dir.path());

        let copied = assemble(Path::new("html"), dir.path(), Some(install.path())).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(
            fs::read_to_string(install.path().join("libs/angular.min.js")).unwrap(),
            "angular"
        );
        assert!(install.path().join("index.html").is_file());
    }

    #[test]
    fn missing_install_dir_fails() {
        let dir = tempdir().unwrap();
        seed_bundle(dir.path());
        let err = assemble(Path::new("html"), dir.path(), None).unwrap_err();
        assert!(matches!(err, BuildError::MissingInstallDir));
    }

    #[test]
    fn identity_copy_is_a_no_op() {
        let dir = tempdir().unwrap();
        seed_bundle(dir.path());
        let same = dir.path().join("html");
        assert_eq!(assemble(Path::new("html"), dir.path(), Some(&same)).unwrap(), 0);
    }

    #[test]
    fn install_inside_bundle_is_rejected() {
        let dir = tempdir().unwrap();
        seed_bundle(dir.path());
        let nested = dir.path().join("html/install");
        let err = assemble(Path::new("html"), dir.path(), Some(&nested)).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
        assert!(!nested.exists());
    }

    #[test]
    fn placement_resolves_missing_destinations() {
        let dir = tempdir().unwrap();
        seed_bundle(dir.path());
        let bundle = dir.path().join("html");
        assert_eq!(placement(&bundle, &bundle).unwrap(), Placement::Same);
        assert_eq!(
            placement(&bundle, &bundle.join("libs/../out/deeper")).unwrap(),
            Placement::Inside
        );
        assert_eq!(
            placement(&bundle, &dir.path().join("install")).unwrap(),
            Placement::Apart
        );
        assert!(!dir.path().join("install").exists());
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_install_dir_fails() {
        let dir = tempdir().unwrap();
        seed_bundle(dir.path());
        fs::write(dir.path().join("blocker"), "file").unwrap();
        let err = assemble(
            Path::new("html"),
            dir.path(),
            Some(&dir.path().join("blocker/install")),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::DestinationUnwritable { .. }));
    }
}
