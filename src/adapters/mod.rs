//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`TungsteniteConnector`] - Real-time channel over tokio-tungstenite
//! - [`ReqwestHttpClient`] - Re-seed requests over reqwest
//! - [`FileStorage`] - One JSON file per durable key
//! - [`ConsoleSurface`] - Line-oriented terminal presentation
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for every seam:
//! - [`mock::MockConnector`] - Scripted dials with a server-side handle per channel
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::MemoryStorage`] - In-memory storage with fault injection
//! - [`mock::RecordingSurface`] - Records renders and indicator changes
//! - [`mock::ManualClock`] - Hand-advanced wall clock

pub mod console_surface;
pub mod file_storage;
pub mod mock;
pub mod reqwest_http;
pub mod tungstenite_ws;

pub use console_surface::ConsoleSurface;
pub use file_storage::FileStorage;
pub use reqwest_http::ReqwestHttpClient;
pub use tungstenite_ws::TungsteniteConnector;
