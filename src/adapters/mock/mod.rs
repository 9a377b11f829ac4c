//! Mock implementations for testing.
//!
//! These run without network, filesystem or wall-clock access and record
//! what the code under test did to them.

pub mod clock;
pub mod connector;
pub mod http;
pub mod storage;
pub mod surface;

use std::sync::{Mutex, MutexGuard};

pub use clock::ManualClock;
pub use connector::{DialScript, MockConnector, MockServer};
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use storage::MemoryStorage;
pub use surface::{RecordingSurface, SurfaceCall};

/// Lock a mock's state, ignoring poisoning from a panicking test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
