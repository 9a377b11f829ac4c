//! The closed set of console modules.

mod browser;
mod dashboard;
mod simulator;
mod traps;
mod view;
mod walker;

pub use browser::{BrowserModule, BrowserState, SAVE_DEBOUNCE};
pub use dashboard::{DashboardModule, STATS_REFRESH_INTERVAL};
pub use simulator::SimulatorModule;
pub use traps::TrapsModule;
pub use view::{BrowserView, DashboardView, SimulatorView, TrapsView, View, WalkerView};
pub use walker::WalkerModule;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::ConsoleApi;
use crate::error::ApiError;
use crate::router::{Module, ModuleFactory, RouteKey};
use crate::traits::{Clock, DurableStorage, Surface};

/// Collaborators shared by every module.
#[derive(Clone)]
pub struct ModuleContext {
    pub api: ConsoleApi,
    pub storage: Arc<dyn DurableStorage>,
    pub surface: Arc<dyn Surface>,
    pub clock: Arc<dyn Clock>,
}

/// Default [`ModuleFactory`] for the console routes.
pub struct ConsoleModules {
    ctx: ModuleContext,
}

impl ConsoleModules {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }
}

impl ModuleFactory for ConsoleModules {
    fn create(&self, route: RouteKey) -> Box<dyn Module> {
        let ctx = self.ctx.clone();
        match route {
            RouteKey::Dashboard => Box::new(DashboardModule::new(ctx)),
            RouteKey::Simulator => Box::new(SimulatorModule::new(ctx)),
            RouteKey::Traps => Box::new(TrapsModule::new(ctx)),
            RouteKey::Walker => Box::new(WalkerModule::new(ctx)),
            RouteKey::Browser => Box::new(BrowserModule::new(ctx)),
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// First error of a multi-call re-seed, preferring one that needs re-login.
pub(crate) fn first_error<I>(results: I) -> Result<(), ApiError>
where
    I: IntoIterator<Item = Result<(), ApiError>>,
{
    let mut first = None;
    for err in results.into_iter().filter_map(Result::err) {
        if err.requires_reauth() {
            return Err(err);
        }
        first.get_or_insert(err);
    }
    first.map_or(Ok(()), Err)
}
