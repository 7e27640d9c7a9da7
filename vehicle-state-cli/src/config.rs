//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vehicle_state_decoder::{DecoderConfig, VehicleVariant};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Replay files, one JSON object per cycle
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VehicleConfig {
    pub variant: Option<VehicleVariant>,
    /// DBC to take the gear code table from
    pub dbc: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Txt,
}

impl OutputFormat {
    /// File extension for written state logs
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "jsonl",
            OutputFormat::Txt => "txt",
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            files = ["drive_01.jsonl", "drive_02.jsonl"]

            [vehicle]
            variant = "BYD TANG 2018 DM"
            dbc = "byd_qin_2014.dbc"

            [output]
            format = "txt"

            [decoder]
            control_hz = 50

            [decoder.speed_filter]
            reset_threshold = 3.0
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.files.len(), 2);
        assert_eq!(config.vehicle.variant, Some(VehicleVariant::BydTang));
        assert_eq!(config.output.format, OutputFormat::Txt);
        assert_eq!(config.decoder.control_hz, 50);
        assert_eq!(config.decoder.speed_filter.reset_threshold, 3.0);
        assert_eq!(config.decoder.speed_filter.dt, 0.01);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.files.is_empty());
        assert_eq!(config.vehicle.variant, None);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.decoder.control_hz, 100);
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let result: std::result::Result<AppConfig, _> = toml::from_str(
            r#"
            [vehicle]
            variant = "TESLA MODEL 3"
        "#,
        );
        assert!(result.is_err());
    }
}
