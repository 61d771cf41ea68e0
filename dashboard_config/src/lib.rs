mod model;

pub use crate::model::{ChartOptions, ChartTheme};

use serde::Serialize;
use serde_json::Value;

const STATUS_THEME: &str = include_str!("themes/status.toml");
const COMPACT_THEME: &str = include_str!("themes/compact.toml");

/// Names accepted by [`builtin_theme`].
pub const BUILTIN_THEMES: &[&str] = &["status", "compact"];

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("invalid theme: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown built-in theme `{0}`")]
    Unknown(String),
}

/// 解析主题文件
pub fn parse_theme(content: &str) -> Result<ChartTheme, ThemeError> {
    Ok(toml::from_str(content)?)
}

pub fn builtin_theme(name: &str) -> Result<ChartTheme, ThemeError> {
    let content = match name {
        "status" => STATUS_THEME,
        "compact" => COMPACT_THEME,
        other => return Err(ThemeError::Unknown(other.to_string())),
    };
    parse_theme(content)
}

/// Data provider injected into the index controller.
pub trait MetaData {
    fn regions(&self) -> &Value;
}

/// Regions fixed at construction time, e.g. read from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct StaticMetaData {
    regions: Value,
}

impl StaticMetaData {
    pub fn new(regions: Value) -> Self {
        Self { regions }
    }
}

impl MetaData for StaticMetaData {
    fn regions(&self) -> &Value {
        &self.regions
    }
}

/// What the index view binds to. Built once, never mutated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexScope<'a> {
    pub regions: &'a Value,
    pub options: &'a ChartOptions,
    pub colors: &'a [String],
    pub dataset_override: &'a [Value],
}

impl<'a> IndexScope<'a> {
    pub fn init<M: MetaData + ?Sized>(meta: &'a M, theme: &'a ChartTheme) -> Self {
        Self {
            regions: meta.regions(),
            options: &theme.options,
            colors: &theme.colors,
            dataset_override: &theme.dataset_override,
        }
    }
}
