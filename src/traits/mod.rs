//! Trait abstractions for dependency injection and testability.
//!
//! Every side effect of the connectivity layer goes through one of these
//! seams, so the session, router and modules can run against mocks.
//!
//! # Traits
//!
//! - [`Connector`] - Real-time channel dialing
//! - [`HttpClient`] - One-shot REST re-seed requests
//! - [`DurableStorage`] - Client-side key-value persistence
//! - [`Clock`] - Wall-clock time for event stamps
//! - [`Surface`] / [`ConnectivityObserver`] - Presentation

pub mod clock;
pub mod http;
pub mod storage;
pub mod surface;
pub mod websocket;

pub use clock::{Clock, SystemClock};
pub use http::{Headers, HttpClient, HttpError, Response};
pub use storage::DurableStorage;
pub use surface::{ConnectivityObserver, Surface};
pub use websocket::{ChannelHandle, Connector, Inbound, Outbound};
