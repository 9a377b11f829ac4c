//! Module routing.
//!
//! Exactly one [`Module`] is active at a time. Navigation always tears the
//! active module down (unsubscribe, cancel timers, persist) before the next
//! location is even resolved.

mod tasks;

pub use tasks::{TaskGate, TaskSet};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::events::{EventBus, Subscription};
use crate::traits::Surface;

/// The closed set of navigable modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKey {
    Dashboard,
    Simulator,
    Traps,
    Walker,
    Browser,
}

impl RouteKey {
    pub const ALL: [RouteKey; 5] = [
        RouteKey::Dashboard,
        RouteKey::Simulator,
        RouteKey::Traps,
        RouteKey::Walker,
        RouteKey::Browser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKey::Dashboard => "dashboard",
            RouteKey::Simulator => "simulator",
            RouteKey::Traps => "traps",
            RouteKey::Walker => "walker",
            RouteKey::Browser => "browser",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        RouteKey::ALL.into_iter().find(|r| r.as_str() == key)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Navigation key of a location: `#traps`, `traps` and `/#traps?x=1` all
/// give `traps`; an empty location gives `dashboard`.
pub fn route_key(location: &str) -> String {
    let fragment = match location.split_once('#') {
        Some((_, fragment)) => fragment,
        None => location,
    };
    let key = fragment
        .split(['?', '/'])
        .find(|part| !part.is_empty())
        .unwrap_or("")
        .trim();
    if key.is_empty() {
        RouteKey::Dashboard.as_str().to_string()
    } else {
        key.to_ascii_lowercase()
    }
}

/// Interactions a module may accept from the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleInput {
    Search(String),
    FilterModule(Option<String>),
    FilterType(Option<String>),
    ExpandNode(String),
    CollapseNode(String),
    SelectNode(String),
    RecordTarget {
        target: String,
        port: u16,
        community: String,
        oid: String,
    },
    ClearHistory,
}

/// A consumer bound to one route.
///
/// The router drives the lifecycle: `restore`, `reseed`, `activate`,
/// `render` on the way in; dropping the subscriptions from `activate` and
/// then `teardown` on the way out.
#[async_trait]
pub trait Module: Send {
    fn route(&self) -> RouteKey;

    /// Load durable state. Storage faults are absorbed here.
    fn restore(&mut self) {}

    /// Fetch current state from the backend.
    async fn reseed(&mut self) -> Result<(), ApiError>;

    /// Subscribe to live updates and start internal timers.
    fn activate(&mut self, bus: &EventBus) -> Vec<Subscription>;

    fn render(&self);

    /// Cancel internal timers and persist.
    fn teardown(&mut self);

    /// Returns whether the input was handled.
    fn handle_input(&mut self, input: ModuleInput) -> bool {
        let _ = input;
        false
    }
}

/// Builds the module for a route.
pub trait ModuleFactory: Send {
    fn create(&self, route: RouteKey) -> Box<dyn Module>;
}

/// Outcome of [`Router::navigate`].
#[derive(Debug)]
pub enum Navigation {
    /// The module is active. A failed re-seed does not prevent activation.
    Activated {
        route: RouteKey,
        reseed: Result<(), ApiError>,
    },
    NotFound(String),
}

impl Navigation {
    pub fn route(&self) -> Option<RouteKey> {
        match self {
            Navigation::Activated { route, .. } => Some(*route),
            Navigation::NotFound(_) => None,
        }
    }

    /// Whether the re-seed was refused for lack of credentials.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Navigation::Activated { reseed: Err(e), .. } if e.requires_reauth())
    }
}

struct ActiveModule {
    module: Box<dyn Module>,
    subscriptions: Vec<Subscription>,
}

pub struct Router {
    bus: EventBus,
    factory: Box<dyn ModuleFactory>,
    surface: Arc<dyn Surface>,
    active: Option<ActiveModule>,
}

impl Router {
    pub fn new(bus: EventBus, factory: Box<dyn ModuleFactory>, surface: Arc<dyn Surface>) -> Self {
        Self {
            bus,
            factory,
            surface,
            active: None,
        }
    }

    pub fn active_route(&self) -> Option<RouteKey> {
        self.active.as_ref().map(|a| a.module.route())
    }

    pub async fn navigate(&mut self, location: &str) -> Navigation {
        self.teardown_active();

        let key = route_key(location);
        let Some(route) = RouteKey::parse(&key) else {
            info!("no module for '{}'", key);
            self.surface.not_found(&key);
            return Navigation::NotFound(key);
        };

        info!("activating {}", route);
        let mut module = self.factory.create(route);
        module.restore();
        let reseed = module.reseed().await;
        if let Err(e) = &reseed {
            log_reseed_failure(route, e);
        }
        let subscriptions = module.activate(&self.bus);
        module.render();

        self.active = Some(ActiveModule {
            module,
            subscriptions,
        });
        Navigation::Activated { route, reseed }
    }

    /// Re-run the active module's re-seed and re-render.
    pub async fn reseed_active(&mut self) -> Option<Result<(), ApiError>> {
        let active = self.active.as_mut()?;
        let route = active.module.route();
        let result = active.module.reseed().await;
        match &result {
            Ok(()) => info!("{} re-seeded", route),
            Err(e) => log_reseed_failure(route, e),
        }
        active.module.render();
        Some(result)
    }

    /// Forward an interaction to the active module.
    pub fn dispatch(&mut self, input: ModuleInput) -> bool {
        match self.active.as_mut() {
            Some(active) => active.module.handle_input(input),
            None => false,
        }
    }

    /// Unsubscribe, cancel timers and persist the active module, if any.
    pub fn teardown_active(&mut self) {
        if let Some(ActiveModule {
            mut module,
            subscriptions,
        }) = self.active.take()
        {
            info!("tearing down {}", module.route());
            drop(subscriptions);
            module.teardown();
        }
    }
}

fn log_reseed_failure(route: RouteKey, e: &ApiError) {
    let category = e.category();
    if category.is_retryable() {
        warn!(
            "{} re-seed failed [{}, {}]: {}; retried on the next reconnect",
            route,
            e.error_code(),
            category,
            e
        );
    } else {
        warn!(
            "{} re-seed failed [{}, {}]: {}. {}",
            route,
            e.error_code(),
            category,
            e,
            category.recovery_hint()
        );
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.teardown_active();
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("active", &self.active_route())
            .finish()
    }
}
