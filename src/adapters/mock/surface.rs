//! Recording presentation mock.

use std::sync::{Arc, Mutex};

use super::lock;
use crate::modules::View;
use crate::router::RouteKey;
use crate::traits::{ConnectivityObserver, Surface};
use crate::websocket::Connectivity;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Render(View),
    NotFound(String),
    RequireLogin,
}

/// Records every [`Surface`] and [`ConnectivityObserver`] call.
/// Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
    states: Arc<Mutex<Vec<Connectivity>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        lock(&self.calls).clone()
    }

    pub fn renders(&self) -> Vec<View> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Render(view) => Some(view.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent render of `route`.
    pub fn last_render(&self, route: RouteKey) -> Option<View> {
        self.renders().into_iter().rev().find(|v| v.route() == route)
    }

    pub fn not_found_keys(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::NotFound(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn login_requests(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, SurfaceCall::RequireLogin))
            .count()
    }

    /// Indicator values in the order they were reported.
    pub fn states(&self) -> Vec<Connectivity> {
        lock(&self.states).clone()
    }

    pub fn last_state(&self) -> Option<Connectivity> {
        lock(&self.states).last().copied()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
        lock(&self.states).clear();
    }
}

impl Surface for RecordingSurface {
    fn render(&self, view: &View) {
        lock(&self.calls).push(SurfaceCall::Render(view.clone()));
    }

    fn not_found(&self, key: &str) {
        lock(&self.calls).push(SurfaceCall::NotFound(key.to_string()));
    }

    fn require_login(&self) {
        lock(&self.calls).push(SurfaceCall::RequireLogin);
    }
}

impl ConnectivityObserver for RecordingSurface {
    fn on_state_change(&self, state: Connectivity) {
        lock(&self.states).push(state);
    }
}
