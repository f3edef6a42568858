use crate::icon::DisplayKind;
use anyhow::Context;
use log::info;
use serde::Deserialize;
use std::{fs::File, io, path::PathBuf};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File that weather records are persisted to
    pub storage_path: PathBuf,
    /// Directory holding the icon assets
    pub icon_dir: PathBuf,
    /// Decides which icon format gets loaded
    pub display: DisplayKind,
}

impl Config {
    const PATH: &'static str = "./config.json";

    /// Load config from the working directory. A missing file means all
    /// defaults.
    pub fn load() -> anyhow::Result<Self> {
        info!("Loading config from `{}`", Self::PATH);
        let file = match File::open(Self::PATH) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).context(format!(
                    "Error opening config file {}",
                    Self::PATH
                ));
            }
        };
        serde_json::from_reader(file)
            .context(format!("Error parsing config file {}", Self::PATH))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: "./weather.json".into(),
            icon_dir: "./resources/icons".into(),
            display: DisplayKind::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial() {
        let config: Config =
            serde_json::from_str(r#"{"display": "color"}"#).unwrap();
        assert_eq!(config.display, DisplayKind::Color);
        assert_eq!(config.storage_path, PathBuf::from("./weather.json"));
        assert_eq!(config.icon_dir, PathBuf::from("./resources/icons"));
    }

    #[test]
    fn test_parse_invalid_display() {
        assert!(
            serde_json::from_str::<Config>(r#"{"display": "eink"}"#).is_err()
        );
    }
}
