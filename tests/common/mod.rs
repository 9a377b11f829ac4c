//! Common test utilities for integration tests.
//!
//! ```ignore
//! let mut console = TestConsole::builder().build();
//! console.app.connect("abc");
//! let server = console.accept().await;
//! ```

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use trishul_link::adapters::mock::{
    ManualClock, MemoryStorage, MockConnector, MockHttpClient, MockResponse, MockServer,
    RecordingSurface,
};
use trishul_link::app::{App, AppDeps};
use trishul_link::config::ConsoleConfig;

pub const API: &str = "http://localhost:8000";

/// Let spawned tasks run without moving the paused clock.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock by `by`, letting due timers fire.
pub async fn advance(by: Duration) {
    tokio::time::sleep(by).await;
    settle().await;
}

/// Canned responses for every re-seed endpoint.
pub fn stub_backend(http: &MockHttpClient) {
    http.set_response(
        &format!("{}/api/simulator/status", API),
        MockResponse::json(json!({"running": true, "port": 1161, "community": "public"})),
    );
    http.set_response(
        &format!("{}/api/traps/status", API),
        MockResponse::json(json!({"running": true, "port": 1162})),
    );
    http.set_response(
        &format!("{}/api/traps/", API),
        MockResponse::json(json!({"data": [
            {"timestamp": 100.5, "source": "10.0.0.7:162", "trap_type": "linkUp"}
        ]})),
    );
    http.set_response(
        &format!("{}/api/stats/", API),
        MockResponse::json(json!({"walks": 0, "traps_received": 1})),
    );
    http.set_response(
        &format!("{}/api/mibs/browse/modules", API),
        MockResponse::json(json!({"modules": [{"name": "IF-MIB", "objects": 112}]})),
    );
}

pub fn trap_frame(timestamp: f64, source: &str) -> String {
    json!({
        "type": "trap",
        "trap": {"timestamp": timestamp, "source": source, "trap_type": "linkDown", "varbinds": []}
    })
    .to_string()
}

pub struct TestConsole {
    pub app: App,
    pub connector: Arc<MockConnector>,
    pub http: MockHttpClient,
    pub storage: MemoryStorage,
    pub surface: RecordingSurface,
    pub clock: Arc<ManualClock>,
}

impl TestConsole {
    pub fn builder() -> TestConsoleBuilder {
        TestConsoleBuilder::default()
    }

    /// Wait for the next accepted dial.
    pub async fn accept(&self) -> MockServer {
        settle().await;
        match self.connector.try_accepted() {
            Some(server) => server,
            None => panic!("no channel was accepted"),
        }
    }

    /// Let the driver run, then handle every queued notice.
    pub async fn pump(&mut self) -> usize {
        settle().await;
        let handled = self.app.pump().await;
        settle().await;
        handled
    }
}

/// Builder for [`TestConsole`] instances.
pub struct TestConsoleBuilder {
    config: ConsoleConfig,
    stub: bool,
    storage: MemoryStorage,
}

impl Default for TestConsoleBuilder {
    fn default() -> Self {
        Self {
            config: ConsoleConfig::default(),
            stub: true,
            storage: MemoryStorage::new(),
        }
    }
}

impl TestConsoleBuilder {
    /// Leave the backend without canned responses.
    pub fn bare_backend(mut self) -> Self {
        self.stub = false;
        self
    }

    /// Share durable storage with an earlier console.
    pub fn with_storage(mut self, storage: MemoryStorage) -> Self {
        self.storage = storage;
        self
    }

    pub fn build(self) -> TestConsole {
        let connector = Arc::new(MockConnector::new());
        let http = MockHttpClient::new();
        if self.stub {
            stub_backend(&http);
        }
        let surface = RecordingSurface::new();
        let clock = Arc::new(ManualClock::default());

        let deps = AppDeps {
            connector: connector.clone(),
            http: Arc::new(http.clone()),
            storage: Arc::new(self.storage.clone()),
            surface: Arc::new(surface.clone()),
            observer: Arc::new(surface.clone()),
            clock: clock.clone(),
        };
        let app = App::new(&self.config, deps);

        TestConsole {
            app,
            connector,
            http,
            storage: self.storage,
            surface,
            clock,
        }
    }
}
