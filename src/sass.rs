use crate::config::SassConfig;
use crate::error::{BuildError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info};

/// Run the vendored stylesheet build and check that it produced `output`.
///
/// A previous build's output is removed first, so a tool that exits cleanly
/// without writing anything is reported instead of leaving stale CSS behind.
pub fn compile(sass: &SassConfig, root: &Path) -> Result<PathBuf> {
    let output = root.join(&sass.output);
    if output.exists() {
        debug!("Removing stale {}", output.display());
        fs::remove_file(&output).map_err(|e| BuildError::unwritable(&output, e))?;
    }

    let workdir = match &sass.workdir {
        Some(dir) => root.join(dir),
        None => root.to_path_buf(),
    };
    if !workdir.is_dir() {
        return Err(BuildError::MissingSource(workdir));
    }

    let status = Command::new(&sass.program)
        .args(&sass.args)
        .current_dir(&workdir)
        .status();

    match status {
        Ok(status) if status.success() => {}
        Ok(status) => {
            error!("{} exited with status: {}", sass.program, status);
            return Err(BuildError::ExternalTool {
                program: sass.program.clone(),
                reason: status.to_string(),
            });
        }
        Err(e) => {
            error!("Failed to execute {}: {}", sass.program, e);
            return Err(BuildError::ExternalTool {
                program: sass.program.clone(),
                reason: e.to_string(),
            });
        }
    }

    if !output.is_file() {
        return Err(BuildError::MissingOutput(output));
    }
    info!("Compiled {}", output.display());
    Ok(output)
}
