use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a simulator log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One simulator log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: f64,
    #[serde(default)]
    pub level: LogLevel,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_defaults_to_info() {
        let line: LogLine =
            serde_json::from_str(r#"{"timestamp": 12.5, "message": "agent started"}"#).unwrap();
        assert_eq!(line.level, LogLevel::Info);
        assert_eq!(line.level.to_string(), "info");
    }

    #[test]
    fn test_unknown_level_rejected() {
        let result = serde_json::from_str::<LogLine>(
            r#"{"timestamp": 1.0, "level": "chatty", "message": "x"}"#,
        );
        assert!(result.is_err());
    }
}
