//! INI file configuration.

use std::path::Path;

use configparser::ini::Ini;

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TraderError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TraderError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
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

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
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
[trading]
pair = BTC-USDT

[backtest]
initial_capital = 10000.0
commission = 0.001
warmup_bars = 30

[strategy]
short_period = 5
long_period = 20

[risk]
max_position_pct = 0.5
stop_loss_enabled = off

[logging]
level = debug
format = json
"#;

    #[test]
    fn from_string_parses_all_sections() {
        let adapter = FileConfigAdapter::from_string(FULL).unwrap();

        assert_eq!(adapter.get_string("trading", "pair"), Some("BTC-USDT".to_string()));
        assert_eq!(adapter.get_double("backtest", "initial_capital", 0.0), 10_000.0);
        assert_eq!(adapter.get_int("backtest", "warmup_bars", 0), 30);
        assert_eq!(adapter.get_int("strategy", "long_period", 0), 20);
        assert_eq!(adapter.get_double("risk", "max_position_pct", 0.0), 0.5);
        assert!(!adapter.get_bool("risk", "stop_loss_enabled", true));
        assert_eq!(adapter.get_string("logging", "format"), Some("json".to_string()));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_int("backtest", "missing", 42), 42);
        assert_eq!(adapter.get_double("backtest", "missing", 99.9), 99.9);
        assert!(adapter.get_bool("backtest", "missing", true));
    }

    #[test]
    fn lenient_getters_ignore_garbage() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\nwarmup_bars = abc\ninitial_capital = lots\n",
        )
        .unwrap();
        assert_eq!(adapter.get_int("backtest", "warmup_bars", 42), 42);
        assert_eq!(adapter.get_double("backtest", "initial_capital", 99.9), 99.9);
    }

    #[test]
    fn strict_getters_reject_garbage() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\nwarmup_bars = abc\ninitial_capital = lots\n[risk]\nstop_loss_enabled = perhaps\n",
        )
        .unwrap();
        assert!(adapter.require_int("backtest", "warmup_bars", 30).is_err());
        assert!(adapter.require_double("backtest", "initial_capital", 1.0).is_err());
        assert!(adapter.require_bool("risk", "stop_loss_enabled", true).is_err());
        assert_eq!(adapter.require_int("backtest", "missing", 30).unwrap(), 30);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[risk]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\n",
        )
        .unwrap();
        for key in ["a", "b", "c"] {
            assert!(adapter.get_bool("risk", key, false));
            assert!(adapter.require_bool("risk", key, false).unwrap());
        }
        for key in ["d", "e", "f"] {
            assert!(!adapter.get_bool("risk", key, true));
            assert!(!adapter.require_bool("risk", key, true).unwrap());
        }
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[strategy]\nshort_period = 7\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("strategy", "short_period", 0), 7);
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TraderError::ConfigParse { .. })));
    }
}
