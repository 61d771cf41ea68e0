use crate::config::{OnMissing, Patch};
use crate::error::{BuildError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    AlreadyApplied,
    /// Target text absent; file rewritten unchanged.
    TargetMissing,
}

/// Apply one rule under `root` and write the result to the rule's destination.
pub fn apply_patch(patch: &Patch, root: &Path, on_missing: OnMissing) -> Result<PatchOutcome> {
    let source = root.join(patch.file());
    let content = match fs::read_to_string(&source) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BuildError::MissingSource(source));
        }
        Err(e) => return Err(BuildError::io(source, e)),
    };

    let (new_content, outcome) = if content.contains(patch.find()) {
        let replaced = match patch {
            Patch::Replace { find, insert, .. } => content.replace(find.as_str(), insert),
            Patch::ReplaceFirst { find, insert, .. } => content.replacen(find.as_str(), insert, 1),
        };
        (replaced, PatchOutcome::Applied)
    } else if content.contains(patch.insert()) {
        debug!("{} already patched", source.display());
        (content, PatchOutcome::AlreadyApplied)
    } else {
        match on_missing {
            OnMissing::Fail => {
                return Err(BuildError::PatchTargetNotFound {
                    file: source,
                    find: patch.find().to_string(),
                });
            }
            OnMissing::Warn => {
                warn!(
                    "`{}` not found in {}, file left unchanged",
                    patch.find(),
                    source.display()
                );
                (content, PatchOutcome::TargetMissing)
            }
        }
    };

    let dest = destination(patch, root)?;
    if outcome != PatchOutcome::Applied && dest == source {
        return Ok(outcome);
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::unwritable(parent, e))?;
    }
    fs::write(&dest, new_content).map_err(|e| BuildError::unwritable(&dest, e))?;
    info!("Patched {}", dest.display());
    Ok(outcome)
}

/// Apply every rule owned by `task`, in declaration order.
pub fn apply_task_patches(
    patches: &[Patch],
    task: &str,
    root: &Path,
    on_missing: OnMissing,
) -> Result<Vec<PatchOutcome>> {
    patches
        .iter()
        .filter(|p| p.task() == task)
        .map(|p| apply_patch(p, root, on_missing))
        .collect()
}

fn destination(patch: &Patch, root: &Path) -> Result<PathBuf> {
    let name = patch.file().file_name().ok_or_else(|| {
        BuildError::config(format!("patch file has no name: {}", patch.file().display()))
    })?;
    Ok(root.join(patch.dest_dir()).join(name))
}
