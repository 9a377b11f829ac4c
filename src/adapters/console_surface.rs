//! Line-oriented terminal presentation used by the binary.

use std::io::Write;

use crate::modules::View;
use crate::traits::{ConnectivityObserver, Surface};
use crate::websocket::Connectivity;

/// Prints views and indicator changes to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSurface;

impl ConsoleSurface {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", text);
        let _ = stdout.flush();
    }
}

impl Surface for ConsoleSurface {
    fn render(&self, view: &View) {
        self.emit(&view.to_string());
    }

    fn not_found(&self, key: &str) {
        self.emit(&format!("-- no module named '{}' --", key));
    }

    fn require_login(&self) {
        self.emit("-- session rejected: log in again and run `connect <token>` --");
    }
}

impl ConnectivityObserver for ConsoleSurface {
    fn on_state_change(&self, state: Connectivity) {
        self.emit(&format!("[{}]", state.label()));
    }
}
