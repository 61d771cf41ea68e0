use crate::error::{BuildError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Project-local build description, looked up under the project root.
pub const CONFIG_FILE_NAME: &str = "meta-maas-build.toml";

const BUILTIN_CONFIG: &str = include_str!("config.toml");

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode")]
pub enum Patch {
    /// Replace every occurrence.
    #[serde(rename = "replace")]
    Replace {
        task: String,
        file: PathBuf,
        find: String,
        insert: String,
        dest: Option<PathBuf>,
    },
    #[serde(rename = "replace_first")]
    ReplaceFirst {
        task: String,
        file: PathBuf,
        find: String,
        insert: String,
        dest: Option<PathBuf>,
    },
}

impl Patch {
    pub fn task(&self) -> &str {
        match self {
            Patch::Replace { task, .. } | Patch::ReplaceFirst { task, .. } => task,
        }
    }

    pub fn file(&self) -> &Path {
        match self {
            Patch::Replace { file, .. } | Patch::ReplaceFirst { file, .. } => file,
        }
    }

    pub fn find(&self) -> &str {
        match self {
            Patch::Replace { find, .. } | Patch::ReplaceFirst { find, .. } => find,
        }
    }

    pub fn insert(&self) -> &str {
        match self {
            Patch::Replace { insert, .. } | Patch::ReplaceFirst { insert, .. } => insert,
        }
    }

    /// Directory the patched file is written to; defaults to the source's own.
    pub fn dest_dir(&self) -> PathBuf {
        let dest = match self {
            Patch::Replace { dest, .. } | Patch::ReplaceFirst { dest, .. } => dest,
        };
        match dest {
            Some(d) => d.clone(),
            None => self
                .file()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMissing {
    #[default]
    Fail,
    Warn,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchPolicy {
    #[serde(default)]
    pub on_missing: OnMissing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SassConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CopyConfig {
    pub dest: PathBuf,
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BundleConfig {
    pub source: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    /// Built-in theme name or theme file under the project root.
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

fn default_theme() -> String {
    "status".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Patch,
    Compile,
    Collect,
    Page,
    Assemble,
    Group,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskDef {
    pub name: String,
    #[serde(default)]
    pub deps: Vec<String>,
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub patch_policy: PatchPolicy,
    #[serde(default)]
    pub patches: Vec<Patch>,
    pub sass: SassConfig,
    pub copy: CopyConfig,
    pub bundle: BundleConfig,
    #[serde(default)]
    pub page: PageConfig,
    pub tasks: Vec<TaskDef>,
}

impl Config {
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CONFIG)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BuildError::config(e.to_string()))
    }

    /// 查找并加载配置：显式路径 > 项目根目录 > 内置
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(p) if p.is_file() => Some(p.to_path_buf()),
            Some(p) => {
                return Err(BuildError::config(format!(
                    "unable to find config: {}",
                    p.display()
                )));
            }
            None => Some(root.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
        };

        match path {
            Some(p) => {
                let content = fs::read_to_string(&p).map_err(|e| BuildError::io(&p, e))?;
                let config = Self::parse(&content).map_err(|e| {
                    BuildError::config(format!("invalid config file {}: {e}", p.display()))
                })?;
                Ok((config, Some(p)))
            }
            None => Ok((Self::builtin()?, None)),
        }
    }
}
