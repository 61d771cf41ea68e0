use crate::config::CopyConfig;
use crate::error::{BuildError, Result};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn generate_random_string(length: usize) -> String {
    let mut rng = rng();
    (0..length)
        .map(|_| rng.sample(Alphanumeric))
        .map(char::from)
        .collect()
}

/// Copy every manifest source into the flat library directory.
///
/// All or nothing: names and sources are checked up front, files are copied
/// into a staging directory next to the destination, then moved into place.
/// A failed move puts back whatever was already replaced. Returns the
/// destination paths in manifest order.
pub fn collect_assets(copy: &CopyConfig, root: &Path) -> Result<Vec<PathBuf>> {
    let mut names = HashSet::new();
    let mut entries = Vec::with_capacity(copy.sources.len());
    for source in &copy.sources {
        let path = root.join(source);
        let name = path
            .file_name()
            .ok_or_else(|| {
                BuildError::config(format!("asset has no file name: {}", source.display()))
            })?
            .to_owned();
        if !names.insert(name.clone()) {
            return Err(BuildError::config(format!(
                "two assets would be copied to the same name: {}",
                Path::new(&name).display()
            )));
        }
        entries.push((path, name));
    }

    let dest = root.join(&copy.dest);
    for (path, name) in &entries {
        if !path.is_file() {
            return Err(BuildError::MissingSource(path.clone()));
        }
        let target = dest.join(name);
        if target.exists() && !target.is_file() {
            return Err(BuildError::config(format!(
                "{} exists and is not a file",
                target.display()
            )));
        }
    }

    fs::create_dir_all(&dest).map_err(|e| BuildError::unwritable(&dest, e))?;
    let staging = dest.join(format!(".staging-{}", generate_random_string(8)));
    fs::create_dir(&staging).map_err(|e| BuildError::unwritable(&staging, e))?;
    let result = stage(&entries, &staging).and_then(|()| commit(&entries, &staging, &dest));
    // 清理暂存目录
    if let Err(e) = fs::remove_dir_all(&staging) {
        warn!("Could not remove {}: {}", staging.display(), e);
    }
    let collected = result?;

    info!("Collected {} assets into {}", collected.len(), dest.display());
    Ok(collected)
}

type Entry = (PathBuf, OsString);

fn stage(entries: &[Entry], staging: &Path) -> Result<()> {
    let new = staging.join("new");
    fs::create_dir(&new).map_err(|e| BuildError::unwritable(&new, e))?;
    for (source, name) in entries {
        fs::copy(source, new.join(name)).map_err(|e| BuildError::io(source, e))?;
        debug!("Staged {}", source.display());
    }
    Ok(())
}

fn commit(entries: &[Entry], staging: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let previous = staging.join("previous");
    fs::create_dir(&previous).map_err(|e| BuildError::unwritable(&previous, e))?;

    let mut committed: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(entries.len());
    for (_, name) in entries {
        let target = dest.join(name);
        let staged = staging.join("new").join(name);
        if let Err(e) = replace(&staged, &target, &previous.join(name), &mut committed) {
            rollback(&committed);
            return Err(e);
        }
    }
    Ok(committed.into_iter().map(|(target, _)| target).collect())
}

fn replace(
    staged: &Path,
    target: &Path,
    backup: &Path,
    committed: &mut Vec<(PathBuf, Option<PathBuf>)>,
) -> Result<()> {
    let saved = if target.exists() {
        fs::rename(target, backup).map_err(|e| BuildError::unwritable(target, e))?;
        Some(backup.to_path_buf())
    } else {
        None
    };
    if let Err(e) = fs::rename(staged, target) {
        if let Some(backup) = &saved {
            if let Err(e) = fs::rename(backup, target) {
                warn!("Could not restore {}: {}", target.display(), e);
            }
        }
        return Err(BuildError::unwritable(target, e));
    }
    committed.push((target.to_path_buf(), saved));
    Ok(())
}

fn rollback(committed: &[(PathBuf, Option<PathBuf>)]) {
    for (target, saved) in committed.iter().rev() {
        let restored = match saved {
            Some(backup) => fs::rename(backup, target),
            None => fs::remove_file(target),
        };
        if let Err(e) = restored {
            warn!("Could not roll back {}: {}", target.display(), e);
        }
    }
}
