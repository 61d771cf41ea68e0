use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Style configuration handed to the chart renderer, loaded from a theme file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChartTheme {
    pub name: String,
    #[serde(default)]
    pub options: ChartOptions,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub dataset_override: Vec<Value>,
}

/// Chart options in the renderer's own schema. Values are not interpreted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Value>,
    #[serde(
        rename = "cutoutPercentage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cutout_percentage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltips: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
