//! Mock HTTP client for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::lock;
use crate::traits::{Headers, HttpClient, HttpError, Response};

/// Configured reply for a URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(Response),
    Error(HttpError),
}

impl MockResponse {
    /// 200 with a JSON body.
    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Success(Response::new(200, bytes::Bytes::from(value.to_string())))
    }

    /// Empty-bodied response with `status`.
    pub fn status(status: u16) -> Self {
        MockResponse::Success(Response::new(status, bytes::Bytes::new()))
    }
}

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Headers,
}

/// Mock [`HttpClient`] with per-URL responses.
///
/// Lookup order: the exact URL, then the URL without its query string, then
/// the default response. Clones share configuration and recorded requests.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, url: &str, response: MockResponse) {
        lock(&self.responses).insert(url.to_string(), response);
    }

    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        lock(&self.requests).iter().map(|r| r.url.clone()).collect()
    }

    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn response_for(&self, url: &str) -> Option<MockResponse> {
        let responses = lock(&self.responses);
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }
        let without_query = url.split_once('?').map(|(base, _)| base).unwrap_or(url);
        if let Some(response) = responses.get(without_query) {
            return Some(response.clone());
        }
        lock(&self.default_response).clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
        });

        match self.response_for(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_exact_then_path_match() {
        let client = MockHttpClient::new();
        client.set_response("http://h/api/traps/", MockResponse::json(json!({"data": []})));
        client.set_response("http://h/api/traps/status", MockResponse::status(401));

        let listing = client.get("http://h/api/traps/?limit=50", &Headers::new()).await.unwrap();
        assert_eq!(listing.status, 200);

        let status = client.get("http://h/api/traps/status", &Headers::new()).await.unwrap();
        assert_eq!(status.status, 401);

        assert_eq!(
            client.requested_urls(),
            vec!["http://h/api/traps/?limit=50", "http://h/api/traps/status"]
        );
    }

    #[tokio::test]
    async fn test_unconfigured_url_errors() {
        let client = MockHttpClient::new();
        let result = client.get("http://h/api/stats/", &Headers::new()).await;
        assert!(matches!(result, Err(HttpError::Other(_))));

        client.set_default_response(MockResponse::Error(HttpError::Timeout("slow".to_string())));
        let result = client.get("http://h/api/stats/", &Headers::new()).await;
        assert!(matches!(result, Err(HttpError::Timeout(_))));
    }
}
