use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::date_range::DateRange;

/// Configuration faults reported to the operator.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration missing: {0}")]
    Missing(String),

    #[error("configuration malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// `YYYY/MM/DD`, inclusive.
    #[serde(default)]
    pub start_date: String,
    /// `YYYY/MM/DD`, exclusive midnight boundary.
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub sheet_name: String,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: String,
    /// Daemon mode run times, `HH:MM` in Tokyo time.
    #[serde(default, deserialize_with = "list_or_comma_separated")]
    pub schedule_times: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrString {
    List(Vec<String>),
    Joined(String),
}

// A JSON list in the file, `"02:30,14:00"` from the environment.
fn list_or_comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(items) => items,
        ListOrString::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_token_cache_path() -> String {
    "token.json".to_string()
}

impl Config {
    /// Load `path` (JSON), with `YSHOP_*` environment variables taking precedence.
    /// Not validated: command-line overrides are applied first, then `validate`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, config::Environment::with_prefix("YSHOP"))
    }

    // Environment values are kept as strings: `YSHOP_SHEET_NAME=007` stays "007".
    fn load_with_env(path: &Path, env: config::Environment) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Missing(format!("file '{}' not found", path.display())));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Json))
            .add_source(env)
            .build()
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Check required values and the format of the optional ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check(true)?;
        self.date_range()?;
        Ok(())
    }

    /// Daemon runs compute their own range, so dates are not required but
    /// at least one schedule time is.
    pub fn validate_for_daemon(&self) -> Result<(), ConfigError> {
        self.check(false)?;
        if self.schedule_times.is_empty() {
            return Err(ConfigError::Missing("schedule_times is required in daemon mode".to_string()));
        }
        Ok(())
    }

    fn check(&self, with_dates: bool) -> Result<(), ConfigError> {
        let mut required = vec![
            ("spreadsheet_id", &self.spreadsheet_id),
            ("sheet_name", &self.sheet_name),
        ];
        if with_dates {
            required.insert(0, ("end_date", &self.end_date));
            required.insert(0, ("start_date", &self.start_date));
        }

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::Missing(format!("required key(s): {}", missing.join(", "))));
        }

        for time in &self.schedule_times {
            parse_schedule_time(time)?;
        }

        Ok(())
    }

    pub fn date_range(&self) -> Result<DateRange, ConfigError> {
        DateRange::parse(&self.start_date, &self.end_date)
            .map_err(|e| ConfigError::Malformed(format!("{:#}", e)))
    }
}

/// Split `HH:MM` into hour and minute.
pub fn parse_schedule_time(time: &str) -> Result<(u32, u32), ConfigError> {
    let malformed = || ConfigError::Malformed(format!("schedule time '{}' is not HH:MM", time));

    let (hour, minute) = time.trim().split_once(':').ok_or_else(malformed)?;
    let hour: u32 = hour.parse().map_err(|_| malformed())?;
    let minute: u32 = minute.parse().map_err(|_| malformed())?;

    if hour > 23 || minute > 59 {
        return Err(malformed());
    }

    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            r#"{
                "start_date": "2024/03/01",
                "end_date": "2024/04/01",
                "spreadsheet_id": "sheet-id",
                "sheet_name": "注文一覧"
            }"#,
        );

        let config = Config::load(file.path()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.sheet_name, "注文一覧");
        assert_eq!(config.credentials_path, "credentials.json");
        assert_eq!(config.token_cache_path, "token.json");
        assert!(config.schedule_times.is_empty());
        assert_eq!(config.date_range().unwrap().to_string(), "2024/03/01 - 2024/04/01");
    }

    #[test]
    fn test_environment_overrides_are_not_coerced() {
        let file = write_config(
            r#"{
                "start_date": "2024/03/01",
                "end_date": "2024/04/01",
                "spreadsheet_id": "sheet-id",
                "sheet_name": "注文一覧",
                "schedule_times": ["09:00"]
            }"#,
        );
        let vars = config::Map::from([
            ("YSHOP_SHEET_NAME".to_string(), "007".to_string()),
            ("YSHOP_SCHEDULE_TIMES".to_string(), "02:30, 14:00".to_string()),
        ]);

        let config = Config::load_with_env(file.path(), config::Environment::with_prefix("YSHOP").source(Some(vars))).unwrap();
        assert_eq!(config.sheet_name, "007");
        assert_eq!(config.schedule_times, ["02:30", "14:00"]);
        assert_eq!(config.spreadsheet_id, "sheet-id");
    }

    #[test]
    fn test_schedule_times_list_from_file() {
        let file = write_config(
            r#"{ "start_date": "2024/03/01", "end_date": "2024/04/01", "spreadsheet_id": "s", "sheet_name": "x", "schedule_times": ["02:30", "14:00"] }"#,
        );
        let config = Config::load_with_env(file.path(), config::Environment::with_prefix("YSHOP").source(Some(config::Map::new()))).unwrap();
        assert_eq!(config.schedule_times, ["02:30", "14:00"]);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_missing_required_key() {
        let file = write_config(r#"{ "start_date": "2024/03/01", "end_date": "2024/04/01", "sheet_name": "x" }"#);
        match Config::load(file.path()).unwrap().validate().unwrap_err() {
            ConfigError::Missing(message) => assert!(message.contains("spreadsheet_id")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let file = write_config("{ not json");
        assert!(matches!(Config::load(file.path()).unwrap_err(), ConfigError::Malformed(_)));
    }

    #[test]
    fn test_bad_date_is_malformed() {
        let file = write_config(
            r#"{ "start_date": "2024-03-01", "end_date": "2024/04/01", "spreadsheet_id": "s", "sheet_name": "x" }"#,
        );
        let err = Config::load(file.path()).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn test_daemon_validation_does_not_need_dates() {
        let file = write_config(r#"{ "spreadsheet_id": "s", "sheet_name": "x", "schedule_times": ["06:00"] }"#);
        let config = Config::load(file.path()).unwrap();

        config.validate_for_daemon().unwrap();
        assert!(matches!(config.validate().unwrap_err(), ConfigError::Missing(_)));
    }

    #[test]
    fn test_daemon_validation_needs_schedule_times() {
        let file = write_config(r#"{ "spreadsheet_id": "s", "sheet_name": "x" }"#);
        let err = Config::load(file.path()).unwrap().validate_for_daemon().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(message) if message.contains("schedule_times")));
    }

    #[test]
    fn test_parse_schedule_time() {
        assert_eq!(parse_schedule_time("02:30").unwrap(), (2, 30));
        assert!(parse_schedule_time("24:00").is_err());
        assert!(parse_schedule_time("0230").is_err());
    }
}
