//! Trap receiver status and received trap history.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::view::{TrapsView, View};
use super::{lock, ModuleContext};
use crate::api::TRAP_RESEED_LIMIT;
use crate::error::ApiError;
use crate::events::{EventBus, EventKind, EventPayload, Subscription};
use crate::history::{HistoryStore, TRAP_HISTORY_CAPACITY, TRAP_HISTORY_KEY};
use crate::models::{ReceiverStatus, TrapRecord};
use crate::router::{Module, ModuleInput, RouteKey};

struct TrapsState {
    receiver: Option<ReceiverStatus>,
    traps: HistoryStore<TrapRecord>,
}

impl TrapsState {
    fn view(&self) -> View {
        View::Traps(TrapsView {
            receiver: self.receiver.clone(),
            traps: self.traps.entries().cloned().collect(),
            total: self.traps.len(),
            latest: self.traps.latest().cloned(),
            top_source: top_source(self.traps.entries()),
        })
    }
}

/// Host with the most traps. Ties go to the host seen most recently.
fn top_source<'a>(traps: impl Iterator<Item = &'a TrapRecord>) -> Option<(String, usize)> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, trap) in traps.enumerate() {
        let host = trap.source_host();
        if host.is_empty() {
            continue;
        }
        counts.entry(host).or_insert((0, position)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (a, a_first)), (_, (b, b_first))| a.cmp(b).then(b_first.cmp(a_first)))
        .map(|(host, (count, _))| (host.to_string(), count))
}

pub struct TrapsModule {
    ctx: ModuleContext,
    state: Arc<Mutex<TrapsState>>,
}

impl TrapsModule {
    pub fn new(ctx: ModuleContext) -> Self {
        let traps = HistoryStore::new(
            TRAP_HISTORY_KEY,
            TRAP_HISTORY_CAPACITY,
            Arc::clone(&ctx.storage),
        );
        Self {
            ctx,
            state: Arc::new(Mutex::new(TrapsState {
                receiver: None,
                traps,
            })),
        }
    }
}

#[async_trait]
impl Module for TrapsModule {
    fn route(&self) -> RouteKey {
        RouteKey::Traps
    }

    fn restore(&mut self) {
        let restored = lock(&self.state).traps.restore();
        debug!("restored {} traps", restored);
    }

    async fn reseed(&mut self) -> Result<(), ApiError> {
        let receiver = self.ctx.api.receiver_status().await?;
        let traps = self.ctx.api.received_traps(TRAP_RESEED_LIMIT).await?;

        let mut state = lock(&self.state);
        state.receiver = Some(receiver);
        let added = state.traps.merge(traps);
        debug!("re-seed added {} traps", added);
        let _ = state.traps.persist();
        Ok(())
    }

    fn activate(&mut self, bus: &EventBus) -> Vec<Subscription> {
        let mut subscriptions: Vec<Subscription> = [EventKind::Status, EventKind::FullState]
            .into_iter()
            .map(|kind| {
                let state = Arc::clone(&self.state);
                let surface = Arc::clone(&self.ctx.surface);
                bus.subscribe(kind, move |event| {
                    let Some(receiver) = event.status().and_then(|s| s.traps.clone()) else {
                        return Ok(());
                    };
                    let view = {
                        let mut state = lock(&state);
                        state.receiver = Some(receiver);
                        state.view()
                    };
                    surface.render(&view);
                    Ok(())
                })
            })
            .collect();

        let state = Arc::clone(&self.state);
        let surface = Arc::clone(&self.ctx.surface);
        subscriptions.push(bus.subscribe(EventKind::Trap, move |event| {
            let EventPayload::Trap(push) = event.payload() else {
                return Ok(());
            };
            let view = {
                let mut state = lock(&state);
                if !state.traps.append(push.trap.clone()) {
                    return Ok(());
                }
                let _ = state.traps.persist();
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
        let _ = lock(&self.state).traps.persist();
    }

    fn handle_input(&mut self, input: ModuleInput) -> bool {
        match input {
            ModuleInput::ClearHistory => {
                lock(&self.state).traps.clear();
                self.render();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockResponse;
    use crate::events::{Event, TrapPush};
    use crate::modules::testing::harness;
    use chrono::Utc;
    use serde_json::json;

    fn trap(ts: f64, source: &str) -> TrapRecord {
        serde_json::from_value(json!({"timestamp": ts, "source": source, "trap_type": "linkDown"}))
            .unwrap()
    }

    fn trap_event(record: TrapRecord) -> Event {
        Event::new(EventPayload::Trap(TrapPush { trap: record }), Utc::now())
    }

    #[test]
    fn test_top_source() {
        let traps = [
            trap(4.0, "10.0.0.2:162"),
            trap(3.0, "10.0.0.1:162"),
            trap(2.0, "10.0.0.1:5000"),
            trap(1.0, "10.0.0.2:162"),
        ];
        // 2 each; 10.0.0.2 was seen most recently
        assert_eq!(
            top_source(traps.iter()),
            Some(("10.0.0.2".to_string(), 2))
        );
        assert_eq!(top_source(std::iter::empty()), None);
    }

    #[tokio::test]
    async fn test_live_trap_then_reseed_keeps_one_copy() {
        let h = harness();
        h.http.set_response(
            "http://lab/api/traps/status",
            MockResponse::json(json!({"running": true, "port": 1162})),
        );
        h.http.set_response(
            "http://lab/api/traps/",
            MockResponse::json(json!({"data": [
                {"timestamp": 7.5, "source": "10.0.0.9:162"},
                {"timestamp": 3.0, "source": "10.0.0.4:162"}
            ]})),
        );

        let bus = EventBus::new();
        let mut module = TrapsModule::new(h.ctx);
        let _subs = module.activate(&bus);
        bus.publish(&trap_event(trap(7.5, "10.0.0.9:162")));

        module.reseed().await.unwrap();
        module.render();

        let Some(View::Traps(view)) = h.surface.last_render(RouteKey::Traps) else {
            panic!("expected a traps render");
        };
        assert_eq!(view.total, 2);
        assert_eq!(view.latest.unwrap().timestamp, 7.5);
        assert_eq!(view.receiver.unwrap().port, Some(1162));
        assert!(h.storage.get_raw(TRAP_HISTORY_KEY).is_some());
    }

    #[tokio::test]
    async fn test_restore_survives_corrupt_storage() {
        let h = harness();
        h.storage.insert_raw(TRAP_HISTORY_KEY, "{not json");
        let mut module = TrapsModule::new(h.ctx);
        module.restore();
        assert!(lock(&module.state).traps.is_empty());
    }

    #[tokio::test]
    async fn test_reseed_auth_failure() {
        let h = harness();
        h.http.set_response("http://lab/api/traps/status", MockResponse::status(401));
        let mut module = TrapsModule::new(h.ctx);
        assert!(module.reseed().await.unwrap_err().requires_reauth());
    }
}
