//! SNMP agent simulator status and its log tail.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::view::{SimulatorView, View};
use super::{lock, ModuleContext};
use crate::error::ApiError;
use crate::events::{EventBus, EventKind, EventPayload, Subscription};
use crate::history::{HistoryStore, LOG_HISTORY_CAPACITY, LOG_HISTORY_KEY};
use crate::models::{LogLine, SimulatorStatus};
use crate::router::{Module, ModuleInput, RouteKey};

struct SimulatorState {
    status: Option<SimulatorStatus>,
    logs: HistoryStore<LogLine>,
}

impl SimulatorState {
    fn view(&self) -> View {
        View::Simulator(SimulatorView {
            status: self.status.clone(),
            logs: self.logs.entries().cloned().collect(),
        })
    }
}

pub struct SimulatorModule {
    ctx: ModuleContext,
    state: Arc<Mutex<SimulatorState>>,
}

impl SimulatorModule {
    pub fn new(ctx: ModuleContext) -> Self {
        let logs = HistoryStore::new(
            LOG_HISTORY_KEY,
            LOG_HISTORY_CAPACITY,
            Arc::clone(&ctx.storage),
        );
        Self {
            ctx,
            state: Arc::new(Mutex::new(SimulatorState { status: None, logs })),
        }
    }
}

#[async_trait]
impl Module for SimulatorModule {
    fn route(&self) -> RouteKey {
        RouteKey::Simulator
    }

    fn restore(&mut self) {
        lock(&self.state).logs.restore();
    }

    async fn reseed(&mut self) -> Result<(), ApiError> {
        let status = self.ctx.api.simulator_status().await?;
        lock(&self.state).status = Some(status);
        Ok(())
    }

    fn activate(&mut self, bus: &EventBus) -> Vec<Subscription> {
        let mut subscriptions: Vec<Subscription> = [EventKind::Status, EventKind::FullState]
            .into_iter()
            .map(|kind| {
                let state = Arc::clone(&self.state);
                let surface = Arc::clone(&self.ctx.surface);
                bus.subscribe(kind, move |event| {
                    let Some(simulator) = event.status().and_then(|s| s.simulator.clone()) else {
                        return Ok(());
                    };
                    let view = {
                        let mut state = lock(&state);
                        state.status = Some(simulator);
                        state.view()
                    };
                    surface.render(&view);
                    Ok(())
                })
            })
            .collect();

        let state = Arc::clone(&self.state);
        let surface = Arc::clone(&self.ctx.surface);
        subscriptions.push(bus.subscribe(EventKind::Log, move |event| {
            let EventPayload::Log(push) = event.payload() else {
                return Ok(());
            };
            let view = {
                let mut state = lock(&state);
                if !state.logs.append(push.line.clone()) {
                    return Ok(());
                }
                let _ = state.logs.persist();
                state.view()
            };
            surface.render(&view);
            Ok(())
        }));

        subscriptions
    }

    fn render(&self) {
        let view = lock(&self.state).view();
        self.ctx.surface.render(&view);
    }

    fn teardown(&mut self) {
        let _ = lock(&self.state).logs.persist();
    }

    fn handle_input(&mut self, input: ModuleInput) -> bool {
        match input {
            ModuleInput::ClearHistory => {
                lock(&self.state).logs.clear();
                self.render();
                true
            }
            _ => false,
        }
    }
}
