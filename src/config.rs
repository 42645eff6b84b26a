use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub width: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub space_per_annotation: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            margin_left: 40.0,
            margin_right: 20.0,
            space_per_annotation: 15.0,
        }
    }
}

impl MarkerConfig {
    /// Horizontal pixel span the time axis is drawn over.
    pub fn plot_range(&self) -> (f64, f64) {
        let start = self.margin_left;
        let end = (self.width - self.margin_right).max(start);
        (start, end)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub markers: MarkerConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MarkerConfigFile {
    width: Option<f64>,
    margin_left: Option<f64>,
    margin_right: Option<f64>,
    space_per_annotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    markers: Option<MarkerConfigFile>,
}

fn apply_marker_overrides(config: &mut MarkerConfig, file: MarkerConfigFile) {
    if let Some(v) = file.width {
        config.width = v;
    }
    if let Some(v) = file.margin_left {
        config.margin_left = v;
    }
    if let Some(v) = file.margin_right {
        config.margin_right = v;
    }
    if let Some(v) = file.space_per_annotation {
        config.space_per_annotation = v;
    }
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    if let Some(markers) = parsed.markers {
        apply_marker_overrides(&mut config.markers, markers);
    }
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}
