//! Application root.
//!
//! [`App`] is the single owner of the transport, the event bus and the
//! router. All bus dispatch happens on the task driving the app, one
//! transport notice at a time, so a handler always runs to completion before
//! the next frame is looked at.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::ConsoleApi;
use crate::config::ConsoleConfig;
use crate::events::{EventBus, EventKind, Subscription};
use crate::modules::{ConsoleModules, ModuleContext};
use crate::router::{ModuleFactory, ModuleInput, Navigation, RouteKey, Router};
use crate::traits::{Clock, ConnectivityObserver, Connector, DurableStorage, HttpClient, Surface};
use crate::websocket::{ConnectionState, Connectivity, Notice, Transport};

/// Everything the app talks to outside the process.
#[derive(Clone)]
pub struct AppDeps {
    pub connector: Arc<dyn Connector>,
    pub http: Arc<dyn HttpClient>,
    pub storage: Arc<dyn DurableStorage>,
    pub surface: Arc<dyn Surface>,
    pub observer: Arc<dyn ConnectivityObserver>,
    pub clock: Arc<dyn Clock>,
}

pub struct App {
    transport: Transport,
    notices: mpsc::UnboundedReceiver<Notice>,
    bus: EventBus,
    router: Router,
    api: ConsoleApi,
    surface: Arc<dyn Surface>,
    observer: Arc<dyn ConnectivityObserver>,
    reseed_requested: Arc<AtomicBool>,
    _on_open: Subscription,
}

impl App {
    /// Build the app with the console's module set. Must be called inside a
    /// tokio runtime.
    pub fn new(config: &ConsoleConfig, deps: AppDeps) -> Self {
        Self::with_modules(config, deps, |ctx| Box::new(ConsoleModules::new(ctx)))
    }

    /// Build the app with a custom module set.
    pub fn with_modules<F>(config: &ConsoleConfig, deps: AppDeps, modules: F) -> Self
    where
        F: FnOnce(ModuleContext) -> Box<dyn ModuleFactory>,
    {
        let (transport, notices) = Transport::spawn(
            config.transport.clone(),
            deps.connector,
            Arc::clone(&deps.clock),
        );
        let api = ConsoleApi::new(deps.http, config.transport.api_base());
        let bus = EventBus::new();

        let ctx = ModuleContext {
            api: api.clone(),
            storage: deps.storage,
            surface: Arc::clone(&deps.surface),
            clock: deps.clock,
        };
        let router = Router::new(bus.clone(), modules(ctx), Arc::clone(&deps.surface));

        let reseed_requested = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&reseed_requested);
        let on_open = bus.subscribe(EventKind::Open, move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        Self {
            transport,
            notices,
            bus,
            router,
            api,
            surface: deps.surface,
            observer: deps.observer,
            reseed_requested,
            _on_open: on_open,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn connect(&self, token: &str) {
        self.api.set_token(Some(token.to_string()));
        self.transport.connect(token);
    }

    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn active_route(&self) -> Option<RouteKey> {
        self.router.active_route()
    }

    pub async fn navigate(&mut self, location: &str) -> Navigation {
        let navigation = self.router.navigate(location).await;
        if navigation.requires_reauth() {
            self.force_login();
        }
        navigation
    }

    pub fn dispatch(&mut self, input: ModuleInput) -> bool {
        self.router.dispatch(input)
    }

    /// Wait for the next transport notice; `None` once the driver is gone.
    ///
    /// Cancel-safe, so it can sit in a `select!` next to other input.
    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    /// Publish or indicate one notice, then run any re-seed it triggered.
    pub async fn handle_notice(&mut self, notice: Notice) {
        match notice {
            Notice::Connectivity(state) => {
                self.observer.on_state_change(state);
                if state == Connectivity::Unauthorized {
                    self.api.set_token(None);
                    self.surface.require_login();
                }
            }
            Notice::Event(event) => {
                let delivered = self.bus.publish(&event);
                debug!("{} delivered to {} handlers", event.kind(), delivered);
            }
        }

        if self.reseed_requested.swap(false, Ordering::SeqCst) {
            if let Some(Err(e)) = self.router.reseed_active().await {
                if e.requires_reauth() {
                    self.force_login();
                }
            }
        }
    }

    /// Handle every notice already queued. Returns how many were handled.
    pub async fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(notice) = self.notices.try_recv() {
            self.handle_notice(notice).await;
            handled += 1;
        }
        handled
    }

    /// Handle notices until `stop` completes or the transport goes away.
    pub async fn run<F>(&mut self, stop: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            tokio::select! {
                _ = &mut stop => break,
                notice = self.notices.recv() => match notice {
                    Some(notice) => self.handle_notice(notice).await,
                    None => break,
                },
            }
        }
    }

    /// Tear the active module down and close the channel.
    pub async fn shutdown(mut self) {
        info!("shutting down");
        self.router.teardown_active();
        self.transport.shutdown().await;
    }

    fn force_login(&mut self) {
        warn!("credential rejected by the console backend; logging out");
        self.transport.disconnect();
        self.api.set_token(None);
        self.surface.require_login();
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("state", &self.transport.state())
            .field("router", &self.router)
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}
