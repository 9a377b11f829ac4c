//! Overview of simulator and receiver status plus usage counters.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::view::{DashboardView, View};
use super::{first_error, lock, ModuleContext};
use crate::error::ApiError;
use crate::events::{EventBus, EventKind, Subscription};
use crate::models::StatusSnapshot;
use crate::router::{Module, RouteKey, TaskSet};

pub const STATS_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct DashboardState {
    status: StatusSnapshot,
    stats: Option<Value>,
}

impl DashboardState {
    fn view(&self) -> View {
        View::Dashboard(DashboardView {
            simulator: self.status.simulator.clone(),
            receiver: self.status.traps.clone(),
            stats: self.stats.clone(),
        })
    }
}

pub struct DashboardModule {
    ctx: ModuleContext,
    state: Arc<Mutex<DashboardState>>,
    tasks: TaskSet,
    refresh_every: Duration,
}

impl DashboardModule {
    pub fn new(ctx: ModuleContext) -> Self {
        Self {
            ctx,
            state: Arc::default(),
            tasks: TaskSet::new(),
            refresh_every: STATS_REFRESH_INTERVAL,
        }
    }

    pub fn with_refresh_interval(mut self, every: Duration) -> Self {
        self.refresh_every = every;
        self
    }

    fn spawn_stats_refresh(&mut self) {
        let api = self.ctx.api.clone();
        let state = Arc::clone(&self.state);
        let surface = Arc::clone(&self.ctx.surface);
        let every = self.refresh_every;
        let gate = self.tasks.gate();

        self.tasks.spawn("stats_refresh", async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match api.stats().await {
                    Ok(stats) => {
                        let Some(_open) = gate.enter() else { return };
                        let view = {
                            let mut state = lock(&state);
                            state.stats = Some(stats);
                            state.view()
                        };
                        surface.render(&view);
                    }
                    Err(e) => debug!("stats refresh failed: {}", e),
                }
            }
        });
    }
}

#[async_trait]
impl Module for DashboardModule {
    fn route(&self) -> RouteKey {
        RouteKey::Dashboard
    }

    async fn reseed(&mut self) -> Result<(), ApiError> {
        let simulator = self.ctx.api.simulator_status().await;
        let receiver = self.ctx.api.receiver_status().await;

        let mut state = lock(&self.state);
        let simulator = simulator.map(|s| state.status.simulator = Some(s));
        let receiver = receiver.map(|r| state.status.traps = Some(r));
        first_error([simulator, receiver])
    }

    fn activate(&mut self, bus: &EventBus) -> Vec<Subscription> {
        let subscriptions = [EventKind::Status, EventKind::FullState]
            .into_iter()
            .map(|kind| {
                let state = Arc::clone(&self.state);
                let surface = Arc::clone(&self.ctx.surface);
                bus.subscribe(kind, move |event| {
                    if let Some(snapshot) = event.status() {
                        let view = {
                            let mut state = lock(&state);
                            state.status.apply(snapshot);
                            state.view()
                        };
                        surface.render(&view);
                    }
                    Ok(())
                })
            })
            .collect();

        self.spawn_stats_refresh();
        subscriptions
    }

    fn render(&self) {
        let view = lock(&self.state).view();
        self.ctx.surface.render(&view);
    }

    fn teardown(&mut self) {
        self.tasks.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockResponse;
    use crate::events::{Event, EventPayload};
    use crate::models::SimulatorStatus;
    use crate::modules::testing::harness;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn test_reseed_reads_both_statuses() {
        let h = harness();
        h.http.set_response(
            "http://lab/api/simulator/status",
            MockResponse::json(json!({"running": true, "port": 1161})),
        );
        h.http.set_response(
            "http://lab/api/traps/status",
            MockResponse::json(json!({"running": false})),
        );

        let mut module = DashboardModule::new(h.ctx);
        module.reseed().await.unwrap();
        module.render();

        let Some(View::Dashboard(view)) = h.surface.last_render(RouteKey::Dashboard) else {
            panic!("expected a dashboard render");
        };
        assert_eq!(view.simulator.unwrap().port, Some(1161));
        assert!(!view.receiver.unwrap().running);
    }

    #[tokio::test]
    async fn test_reseed_keeps_partial_results() {
        let h = harness();
        h.http.set_response(
            "http://lab/api/simulator/status",
            MockResponse::json(json!({"running": true})),
        );
        h.http.set_response("http://lab/api/traps/status", MockResponse::status(500));

        let mut module = DashboardModule::new(h.ctx);
        assert!(matches!(
            module.reseed().await,
            Err(ApiError::Status { status: 500, .. })
        ));
        assert!(lock(&module.state).status.simulator.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_status_and_stats_refresh() {
        let h = harness();
        h.http
            .set_response("http://lab/api/stats/", MockResponse::json(json!({"walks": 3})));

        let bus = EventBus::new();
        let mut module = DashboardModule::new(h.ctx);
        let subs = module.activate(&bus);
        assert_eq!(subs.len(), 2);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.http.requested_urls(), vec!["http://lab/api/stats/"]);

        bus.publish(&Event::new(
            EventPayload::Status(StatusSnapshot {
                simulator: Some(SimulatorStatus {
                    running: true,
                    ..Default::default()
                }),
                traps: None,
            }),
            Utc::now(),
        ));
        let Some(View::Dashboard(view)) = h.surface.last_render(RouteKey::Dashboard) else {
            panic!("expected a dashboard render");
        };
        assert!(view.simulator.unwrap().running);
        assert_eq!(view.stats, Some(json!({"walks": 3})));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(h.http.requested_urls().len(), 2);

        drop(subs);
        module.teardown();
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(h.http.requested_urls().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_render_after_teardown_on_worker_threads() {
        let h = harness();
        h.http
            .set_response("http://lab/api/stats/", MockResponse::json(json!({"walks": 1})));
        let bus = EventBus::new();

        for _ in 0..300 {
            let mut module =
                DashboardModule::new(h.ctx.clone()).with_refresh_interval(Duration::from_micros(50));
            let subs = module.activate(&bus);
            tokio::task::yield_now().await;

            drop(subs);
            module.teardown();
            let at_teardown = h.surface.renders().len();
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert_eq!(h.surface.renders().len(), at_teardown);
        }
    }
}
