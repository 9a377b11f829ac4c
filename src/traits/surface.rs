//! Presentation seams.
//!
//! The connectivity layer never draws anything itself. Modules hand a
//! [`View`] snapshot to a [`Surface`], and the connection indicator is fed
//! through a [`ConnectivityObserver`].

use crate::modules::View;
use crate::websocket::Connectivity;

/// Where module views, not-found notices and login prompts go.
pub trait Surface: Send + Sync {
    /// Draw the current snapshot of the active module.
    fn render(&self, view: &View);

    /// The location named a route outside the closed module set.
    fn not_found(&self, key: &str);

    /// The credential was rejected; the collaborator's login flow takes over.
    fn require_login(&self);
}

/// Receives every connection indicator transition.
pub trait ConnectivityObserver: Send + Sync {
    fn on_state_change(&self, state: Connectivity);
}
