use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::Path;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Materialization configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoadConfig {
    /// Column consulted when the timestamp role is the implicit sentinel.
    #[serde(default = "default_time_column")]
    pub default_time_column: String,
    /// Ticks per second of the emitted timestamps. The default is
    /// microsecond resolution.
    #[serde(default = "default_time_units")]
    pub time_units_per_second: i64,
}

fn default_time_column() -> String {
    "time".to_string()
}

fn default_time_units() -> i64 {
    1_000_000
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            default_time_column: default_time_column(),
            time_units_per_second: default_time_units(),
        }
    }
}

impl LoadConfig {
    /// Normalize a native epoch-millisecond tick into configured time units.
    pub fn ticks_from_millis(&self, millis: i64) -> i64 {
        (millis as i128 * self.time_units_per_second as i128 / 1000) as i64
    }

    /// Normalize a parsed date-time into configured time units, keeping
    /// sub-second precision up to the configured resolution.
    pub fn ticks_from_datetime(&self, datetime: &DateTime<FixedOffset>) -> i64 {
        let seconds = datetime.timestamp() * self.time_units_per_second;
        let subsec = datetime.timestamp_subsec_nanos() as i128 * self.time_units_per_second as i128
            / NANOS_PER_SECOND as i128;
        seconds + subsec as i64
    }
}

/// Load configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LoadConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let config: LoadConfig =
        serde_yaml_ng::from_str(&content).with_context(|| "Failed to parse YAML configuration")?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
pub(crate) fn validate_config(config: &LoadConfig) -> Result<()> {
    if config.default_time_column.is_empty() {
        anyhow::bail!("default_time_column cannot be empty");
    }

    if config.time_units_per_second <= 0 {
        anyhow::bail!("time_units_per_second must be greater than 0");
    }

    if NANOS_PER_SECOND % config.time_units_per_second != 0 {
        anyhow::bail!(
            "time_units_per_second must divide {} evenly",
            NANOS_PER_SECOND
        );
    }

    Ok(())
}

/// Write an example configuration file with the defaults spelled out.
pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let example = "\
# seriesload configuration
#
# Column used when the role spec maps 'timestamp' to null.
default_time_column: \"time\"

# Tick resolution of emitted timestamps (ticks per second).
# 1000 = milliseconds, 1000000 = microseconds, 1000000000 = nanoseconds.
time_units_per_second: 1000000
";
    std::fs::write(&path, example)
        .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoadConfig::default();
        assert_eq!(config.default_time_column, "time");
        assert_eq!(config.time_units_per_second, 1_000_000);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_tick_normalization() {
        let micros = LoadConfig::default();
        assert_eq!(micros.ticks_from_millis(1_672_531_200_000), 1_672_531_200_000_000);

        let millis = LoadConfig {
            time_units_per_second: 1000,
            ..LoadConfig::default()
        };
        assert_eq!(millis.ticks_from_millis(1_672_531_200_000), 1_672_531_200_000);
    }

    #[test]
    fn test_datetime_normalization_keeps_subseconds() {
        let config = LoadConfig::default();
        let datetime = DateTime::parse_from_rfc3339("2023-01-01T00:00:00.5Z").unwrap();
        assert_eq!(
            config.ticks_from_datetime(&datetime),
            1_672_531_200_500_000
        );
    }

    #[test]
    fn test_millisecond_and_string_sources_normalize_alike() {
        let config = LoadConfig::default();
        let datetime = DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z").unwrap();
        assert_eq!(
            config.ticks_from_datetime(&datetime),
            config.ticks_from_millis(1_672_531_200_000)
        );
    }

    #[test]
    fn test_validation_rejects_bad_units() {
        let zero = LoadConfig {
            time_units_per_second: 0,
            ..LoadConfig::default()
        };
        assert!(validate_config(&zero).is_err());

        let uneven = LoadConfig {
            time_units_per_second: 3000,
            ..LoadConfig::default()
        };
        assert!(validate_config(&uneven).is_err());
    }

    #[test]
    fn test_example_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seriesload.yaml");
        create_example_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.default_time_column, "time");
        assert_eq!(config.time_units_per_second, 1_000_000);
    }
}
