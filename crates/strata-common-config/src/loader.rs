//! Configuration parsing.

use std::path::Path;

use thiserror::Error;

use crate::types::StructureConfig;

/// File names tried for the config document inside `.structure/`, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["config.yaml", "config.yml", "config.json"];

/// Config parsing errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "invalid YAML at line {}: {message}",
        line.map_or_else(|| "unknown".to_string(), |l| l.to_string())
    )]
    Yaml { line: Option<usize>, message: String },

    #[error("invalid JSON at line {line}: {message}")]
    Json { line: usize, message: String },

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Infer the format from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }
}

/// Parse config text. Missing fields take their defaults; an empty YAML
/// document yields the default config.
pub fn parse(content: &str, format: ConfigFormat) -> Result<StructureConfig, ConfigError> {
    match format {
        ConfigFormat::Yaml => {
            if is_blank_yaml(content) {
                return Ok(StructureConfig::default());
            }
            serde_yaml::from_str(content).map_err(|e| ConfigError::Yaml {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })
        }
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| ConfigError::Json {
            line: e.line(),
            message: e.to_string(),
        }),
    }
}

fn is_blank_yaml(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}
