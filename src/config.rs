//! Global calgrid configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Weekday;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

static DEFAULT_EVENTS_FILE: &str = "~/calendar/events.toml";
static DEFAULT_LOG_LEVEL: &str = "warn";

fn default_events_file() -> PathBuf {
    PathBuf::from(DEFAULT_EVENTS_FILE)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// First column of week and month grids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

/// Configuration at ~/.config/calgrid/config.toml
///
/// Every key can be overridden from the environment with a `CALGRID_`
/// prefix, e.g. `CALGRID_WEEK_START=monday`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CalgridConfig {
    #[serde(default = "default_events_file")]
    pub events_file: PathBuf,

    #[serde(default)]
    pub week_start: WeekStart,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CalgridConfig {
    fn default() -> Self {
        CalgridConfig {
            events_file: default_events_file(),
            week_start: WeekStart::default(),
            log_level: default_log_level(),
        }
    }
}

impl CalgridConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("calgrid");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config, writing a commented default file on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: CalgridConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("CALGRID"))
            .build()
            .with_context(|| format!("Could not read config file {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Invalid config in {}", path.display()))?;

        Ok(config)
    }

    /// Events file path with `~` expanded.
    pub fn events_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.events_file.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# calgrid configuration

# Event file read by `calgrid expand`, `grid` and `move`:
# events_file = \"{}\"

# First day of the week in grids (sunday or monday):
# week_start = \"sunday\"

# Log level when RUST_LOG is not set:
# log_level = \"{}\"
",
            DEFAULT_EVENTS_FILE, DEFAULT_LOG_LEVEL
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create config directory")?;
        }

        std::fs::write(path, contents).context("Could not write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calgrid").join("config.toml");

        CalgridConfig::create_default_config(&path).unwrap();
        let config = CalgridConfig::load_from(&path).unwrap();

        assert_eq!(config.events_file, PathBuf::from(DEFAULT_EVENTS_FILE));
        assert_eq!(config.week_start, WeekStart::Sunday);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "events_file = \"/tmp/team.toml\"\nweek_start = \"monday\"\n",
        )
        .unwrap();

        let config = CalgridConfig::load_from(&path).unwrap();
        assert_eq!(config.events_path(), PathBuf::from("/tmp/team.toml"));
        assert_eq!(config.week_start.weekday(), Weekday::Mon);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = CalgridConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn tilde_is_expanded_in_events_path() {
        let config = CalgridConfig::default();
        assert!(!config.events_path().to_string_lossy().starts_with('~'));
    }
}
