use std::path::PathBuf;

/// Failures of a pipeline step. All of them halt the build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("source file not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("patch target `{find}` not found in {}", .file.display())]
    PatchTargetNotFound { file: PathBuf, find: String },

    #[error("external tool `{program}` failed: {reason}")]
    ExternalTool { program: String, reason: String },

    #[error("expected output was not produced: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("cannot write to {}: {source}", .path.display())]
    DestinationUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("install directory not set (pass --install-dir or SNAPCRAFT_PART_INSTALL)")]
    MissingInstallDir,

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown task `{0}`")]
    UnknownTask(String),

    #[error("task `{task}` depends on unknown task `{dep}`")]
    UnknownDependency { task: String, dep: String },

    #[error("task `{0}` is declared more than once")]
    DuplicateTask(String),

    #[error("task graph contains a cycle through: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("task `{task}` failed: {source}")]
    Task {
        task: String,
        source: Box<BuildError>,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unwritable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DestinationUnwritable {
            path: path.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
