//! INI file configuration adapter.
//!
//! ```ini
//! [exchange]
//! provider = terminal
//!
//! [terminal]
//! export_dir = /home/trader/.wine/drive_c/MT5/MQL5/Files/export
//!
//! [yahoo]
//! timeout_secs = 30
//!
//! [logging]
//! level = info
//! ```

use crate::domain::error::ExchangeError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExchangeError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| ExchangeError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ExchangeError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ExchangeError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const FULL: &str = r#"
[exchange]
provider = terminal

[terminal]
export_dir = /srv/mt5/export

[yahoo]
base_url = https://query2.finance.yahoo.com
timeout_secs = 10

[logging]
level = debug
"#;

    #[test]
    fn from_string_parses_config() {
        let adapter = FileConfigAdapter::from_string(FULL).unwrap();
        assert_eq!(
            adapter.get_string("exchange", "provider"),
            Some("terminal".to_string())
        );
        assert_eq!(
            adapter.get_string("terminal", "export_dir"),
            Some("/srv/mt5/export".to_string())
        );
        assert_eq!(adapter.get_int("yahoo", "timeout_secs", 30), 10);
        assert_eq!(
            adapter.get_string("logging", "level"),
            Some("debug".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[yahoo]\ntimeout_secs = 5\n").unwrap();
        assert_eq!(adapter.get_string("yahoo", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[yahoo]\ntimeout_secs = abc\n").unwrap();
        assert_eq!(adapter.get_int("yahoo", "timeout_secs", 42), 42);
        assert_eq!(adapter.get_int("yahoo", "missing", 7), 7);
    }

    #[test]
    fn require_string_rejects_missing_and_blank() {
        let adapter = FileConfigAdapter::from_string("[terminal]\nexport_dir =\n").unwrap();
        let err = adapter.require_string("terminal", "export_dir").unwrap_err();
        assert_eq!(err.to_string(), "missing config key [terminal] export_dir");
        assert!(adapter.require_string("exchange", "provider").is_err());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[terminal]\nexport_dir = /tmp/export\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.require_string("terminal", "export_dir").unwrap(),
            "/tmp/export"
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(ExchangeError::ConfigParse { .. })));
    }
}
