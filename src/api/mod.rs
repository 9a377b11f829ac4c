//! One-shot REST re-seed calls.
//!
//! Every call is an idempotent GET authenticated with the session token as a
//! bearer credential. HTTP 401 maps to [`ApiError::Unauthorized`]; the
//! application root turns that into a forced re-login.

use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::models::{MibModule, ReceiverStatus, SimulatorStatus, TrapRecord};
use crate::traits::{Headers, HttpClient};

pub const SIMULATOR_STATUS_PATH: &str = "/api/simulator/status";
pub const RECEIVER_STATUS_PATH: &str = "/api/traps/status";
pub const RECEIVED_TRAPS_PATH: &str = "/api/traps/";
pub const STATS_PATH: &str = "/api/stats/";
pub const MIB_MODULES_PATH: &str = "/api/mibs/browse/modules";

/// Traps requested per re-seed.
pub const TRAP_RESEED_LIMIT: usize = 50;

#[derive(Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Deserialize)]
struct ModulesEnvelope {
    #[serde(default)]
    modules: Vec<MibModule>,
}

/// Client for the console backend's re-seed endpoints.
///
/// Cloning is cheap; clones share the HTTP client and the current token.
#[derive(Clone)]
pub struct ConsoleApi {
    http: Arc<dyn HttpClient>,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ConsoleApi {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the credential used for subsequent calls.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = token;
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .map(|t| t.is_some())
            .unwrap_or_else(|p| p.into_inner().is_some())
    }

    pub async fn simulator_status(&self) -> Result<SimulatorStatus, ApiError> {
        self.get_json(SIMULATOR_STATUS_PATH).await
    }

    pub async fn receiver_status(&self) -> Result<ReceiverStatus, ApiError> {
        self.get_json(RECEIVER_STATUS_PATH).await
    }

    /// Most recent traps held by the receiver, newest first.
    pub async fn received_traps(&self, limit: usize) -> Result<Vec<TrapRecord>, ApiError> {
        let path = format!("{}?limit={}", RECEIVED_TRAPS_PATH, limit);
        let envelope: DataEnvelope<TrapRecord> = self.get_json(&path).await?;
        Ok(envelope.data)
    }

    /// Aggregate usage counters; the shape is owned by the backend.
    pub async fn stats(&self) -> Result<serde_json::Value, ApiError> {
        self.get_json(STATS_PATH).await
    }

    pub async fn mib_modules(&self) -> Result<Vec<MibModule>, ApiError> {
        let envelope: ModulesEnvelope = self.get_json(MIB_MODULES_PATH).await?;
        Ok(envelope.modules)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url, &self.headers())
            .await
            .map_err(|source| ApiError::Request {
                path: path.to_string(),
                source,
            })?;
        debug!("GET {} -> {}", path, response.status);

        match response.status {
            401 => Err(ApiError::Unauthorized {
                path: path.to_string(),
            }),
            status if !response.is_success() => Err(ApiError::Status {
                path: path.to_string(),
                status,
                message: response.text().unwrap_or_default(),
            }),
            _ => response.json().map_err(|e| ApiError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        let token = self.token.read().unwrap_or_else(|p| p.into_inner());
        if let Some(token) = token.as_deref() {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }
}

impl std::fmt::Debug for ConsoleApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleApi")
            .field("base_url", &self.base_url)
            .field("has_token", &self.has_token())
            .finish()
    }
}
