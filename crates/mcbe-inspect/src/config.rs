use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct InspectConfig {
    pub world: WorldSection,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    /// World directory holding `level.dat`, `levelname.txt` and `db/`.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct ScanSection {
    /// Records between progress lines. 0 = disabled. Default: 10000.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    /// Count records first so progress lines show a percentage.
    #[serde(default = "default_count_first")]
    pub count_first: bool,
    /// Print every decoded NBT record as JSON on stdout.
    #[serde(default)]
    pub dump_nbt: bool,
    /// How many decode errors to list after the scan.
    #[serde(default = "default_max_errors_shown")]
    pub max_errors_shown: usize,
}

fn default_progress_interval() -> u64 {
    10_000
}

fn default_count_first() -> bool {
    true
}

fn default_max_errors_shown() -> usize {
    20
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            count_first: default_count_first(),
            dump_nbt: false,
            max_errors_shown: default_max_errors_shown(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl InspectConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [world]
            path = "worlds/My World"

            [scan]
            progress_interval = 500
            count_first = false
            dump_nbt = true

            [logging]
            level = "debug"
        "#;
        let config: InspectConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.world.path, PathBuf::from("worlds/My World"));
        assert_eq!(config.scan.progress_interval, 500);
        assert!(!config.scan.count_first);
        assert!(config.scan.dump_nbt);
        assert_eq!(config.scan.max_errors_shown, 20); // default
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn sections_default_when_absent() {
        let config: InspectConfig = toml::from_str("[world]\npath = \"w\"\n").unwrap();
        assert_eq!(config.scan.progress_interval, 10_000);
        assert!(config.scan.count_first);
        assert!(!config.scan.dump_nbt);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn world_path_is_required() {
        assert!(toml::from_str::<InspectConfig>("[logging]\nlevel = \"info\"\n").is_err());
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(InspectConfig::load("/nonexistent/inspect.toml").is_err());
    }
}
