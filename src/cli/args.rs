//! Command-line argument parsing for trishul-link.

use std::path::PathBuf;

use crate::config::{parse_bool, ConsoleConfig};
use crate::error::{ConfigError, ConsoleResult};

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Run the console with these overrides (default)
    Run(CliOptions),
}

/// Flags that override the environment-derived configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub host: Option<String>,
    pub secure: Option<bool>,
    pub token: Option<String>,
    pub route: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl CliOptions {
    /// Overlay the flags on `config` and re-validate.
    pub fn apply(self, mut config: ConsoleConfig) -> Result<ConsoleConfig, ConfigError> {
        if let Some(host) = self.host {
            config = config.with_host(host);
        }
        if let Some(secure) = self.secure {
            config = config.with_secure(secure);
        }
        if let Some(token) = self.token {
            config = config.with_token(token);
        }
        if let Some(route) = self.route {
            config = config.with_route(route);
        }
        if let Some(dir) = self.data_dir {
            config = config.with_data_dir(dir);
        }
        config.validate()?;
        Ok(config)
    }

    /// Environment-derived configuration with these flags on top.
    pub fn resolve(self) -> ConsoleResult<ConsoleConfig> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(self, lookup: F) -> ConsoleResult<ConsoleConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ConsoleConfig::from_lookup(lookup)?;
        Ok(self.apply(config)?)
    }
}

pub const USAGE: &str = "\
usage: trishul-link [--host HOST[:PORT]] [--secure[=BOOL]] [--token TOKEN]
                    [--route ROUTE] [--data-dir DIR] [--version] [--help]";

/// Parse command-line arguments and return the appropriate command.
///
/// `--flag value` and `--flag=value` are both accepted.
///
/// # Examples
///
/// ```
/// use trishul_link::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["trishul-link".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()).unwrap(), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ConfigError>
where
    I: Iterator<Item = String>,
{
    let mut options = CliOptions::default();
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };

        let mut value = |flag: &str| -> Result<String, ConfigError> {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| ConfigError::MissingValue {
                    flag: flag.to_string(),
                })
        };

        match flag.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--host" => options.host = Some(value("--host")?),
            "--token" => options.token = Some(value("--token")?),
            "--route" => options.route = Some(value("--route")?),
            "--data-dir" => options.data_dir = Some(PathBuf::from(value("--data-dir")?)),
            "--secure" => {
                options.secure = Some(match &inline {
                    Some(v) => parse_bool("--secure", v)?,
                    None => true,
                })
            }
            _ => return Err(ConfigError::UnknownArgument(flag)),
        }
    }
    Ok(CliCommand::Run(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn parse(args: &[&str]) -> Result<CliCommand, ConfigError> {
        let mut all = vec!["trishul-link".to_string()];
        all.extend(args.iter().map(|a| a.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]).unwrap(), CliCommand::Version);
        assert_eq!(parse(&["-V"]).unwrap(), CliCommand::Version);
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["--host", "lab", "-h"]).unwrap(), CliCommand::Help);
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]).unwrap(), CliCommand::Run(CliOptions::default()));
    }

    #[test]
    fn test_parse_run_options() {
        let command = parse(&[
            "--host",
            "lab:8000",
            "--secure",
            "--token=abc",
            "--route",
            "#traps",
            "--data-dir",
            "/tmp/trishul",
        ])
        .unwrap();
        assert_eq!(
            command,
            CliCommand::Run(CliOptions {
                host: Some("lab:8000".to_string()),
                secure: Some(true),
                token: Some("abc".to_string()),
                route: Some("#traps".to_string()),
                data_dir: Some(PathBuf::from("/tmp/trishul")),
            })
        );
    }

    #[test]
    fn test_parse_secure_value() {
        let CliCommand::Run(options) = parse(&["--secure=false"]).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(options.secure, Some(false));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse(&["--host"]),
            Err(ConfigError::MissingValue {
                flag: "--host".to_string()
            })
        );
        assert_eq!(
            parse(&["--unknown"]),
            Err(ConfigError::UnknownArgument("--unknown".to_string()))
        );
    }

    #[test]
    fn test_apply_overrides_config() {
        let options = CliOptions {
            host: Some("10.1.1.1:9000".to_string()),
            route: Some("walker".to_string()),
            ..Default::default()
        };
        let config = options.apply(ConsoleConfig::default().with_token("env")).unwrap();
        assert_eq!(config.transport.host, "10.1.1.1:9000");
        assert_eq!(config.route, "walker");
        assert_eq!(config.token.as_deref(), Some("env"));

        let bad = CliOptions {
            host: Some("ws://lab".to_string()),
            ..Default::default()
        };
        assert!(bad.apply(ConsoleConfig::default()).is_err());
    }

    #[test]
    fn test_resolve_layers_flags_over_environment() {
        let env = |name: &str| match name {
            "TRISHUL_HOST" => Some("lab:8000".to_string()),
            "TRISHUL_TOKEN" => Some("from-env".to_string()),
            _ => None,
        };
        let options = CliOptions {
            token: Some("from-flag".to_string()),
            ..Default::default()
        };
        let config = options.resolve_with(env).unwrap();
        assert_eq!(config.transport.host, "lab:8000");
        assert_eq!(config.token.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_resolve_errors_are_configuration_faults() {
        let bad_env = |name: &str| (name == "TRISHUL_SECURE").then(|| "maybe".to_string());
        let err = CliOptions::default().resolve_with(bad_env).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.error_code(), "E_CONFIG");

        let bad_flag = CliOptions {
            host: Some("ws://lab".to_string()),
            ..Default::default()
        };
        let err = bad_flag.resolve_with(|_| None).unwrap_err();
        assert!(!err.category().is_retryable());
    }
}
