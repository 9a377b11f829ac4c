//! Unified error handling for the connectivity layer.
//!
//! Errors follow the fault taxonomy of the layer:
//!
//! | Fault | Type | Handling |
//! |-------|------|----------|
//! | Transient transport | [`TransportError`] | Backoff reconnection, indicator only |
//! | Authentication | [`TransportError::HandshakeRejected`], [`ApiError::Unauthorized`] | Terminal, forces re-login |
//! | Decode | dropped in `websocket::messages` | Silently discarded |
//! | Storage | [`StorageError`] | Logged, treated as empty history |
//! | Duplicate delivery | not an error | Idempotent append |
//!
//! Nothing here is fatal to the process.

mod api;
mod category;
mod config;
mod console_error;
mod storage;
mod transport;

pub use api::ApiError;
pub use category::ErrorCategory;
pub use config::ConfigError;
pub use console_error::{ConsoleError, ConsoleResult};
pub use storage::StorageError;
pub use transport::TransportError;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_error_unification() {
        let transport: ConsoleError = TransportError::Closed.into();
        let api: ConsoleError = ApiError::Unauthorized {
            path: "/api/traps/".to_string(),
        }
        .into();
        let storage: ConsoleError = StorageError::NoDataDirectory.into();
        let config: ConsoleError = ConfigError::UnknownArgument("--bogus".to_string()).into();

        assert_eq!(transport.category(), ErrorCategory::Network);
        assert_eq!(api.category(), ErrorCategory::Auth);
        assert_eq!(storage.category(), ErrorCategory::System);
        assert_eq!(config.category(), ErrorCategory::Configuration);

        assert_eq!(transport.error_code(), "E_WS_CLOSED");
        for err in [&transport, &api, &storage, &config] {
            assert!(!err.error_code().is_empty());
        }
    }

    #[test]
    fn test_retry_logic() {
        let retryable: Vec<ConsoleError> = vec![
            TransportError::Dial {
                url: "ws://localhost/api/ws".to_string(),
                message: "refused".to_string(),
            }
            .into(),
            ApiError::Status {
                path: "/api/stats/".to_string(),
                status: 500,
                message: "boom".to_string(),
            }
            .into(),
        ];
        for err in retryable {
            assert!(err.category().is_retryable(), "Expected {:?} to be retryable", err);
        }

        let permanent: Vec<ConsoleError> = vec![
            TransportError::HandshakeRejected { status: 401 }.into(),
            StorageError::NoDataDirectory.into(),
            ConfigError::InvalidHost(String::new()).into(),
        ];
        for err in permanent {
            assert!(!err.category().is_retryable(), "Expected {:?} to not be retryable", err);
        }
    }

    #[test]
    fn test_auth_faults_share_a_category() {
        let rejected: ConsoleError = TransportError::HandshakeRejected { status: 403 }.into();
        let api: ConsoleError = ApiError::Unauthorized {
            path: "/api/simulator/status".to_string(),
        }
        .into();
        assert_eq!(rejected.category(), ErrorCategory::Auth);
        assert_eq!(api.category(), ErrorCategory::Auth);
        assert!(rejected.category().recovery_hint().contains("Sign in"));
    }
}
