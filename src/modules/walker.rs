//! SNMP walk launcher; remembers recently used targets.

use std::sync::Arc;

use async_trait::async_trait;

use super::view::{View, WalkerView};
use super::ModuleContext;
use crate::error::ApiError;
use crate::events::{EventBus, Subscription};
use crate::history::{RecentTarget, RecentTargets};
use crate::router::{Module, ModuleInput, RouteKey};

pub struct WalkerModule {
    ctx: ModuleContext,
    recent: RecentTargets,
}

impl WalkerModule {
    pub fn new(ctx: ModuleContext) -> Self {
        let recent = RecentTargets::new(Arc::clone(&ctx.storage));
        Self { ctx, recent }
    }
}

#[async_trait]
impl Module for WalkerModule {
    fn route(&self) -> RouteKey {
        RouteKey::Walker
    }

    fn restore(&mut self) {
        self.recent.load();
    }

    // Walks are launched on demand; there is no server state to re-seed.
    async fn reseed(&mut self) -> Result<(), ApiError> {
        Ok(())
    }

    fn activate(&mut self, _bus: &EventBus) -> Vec<Subscription> {
        Vec::new()
    }

    fn render(&self) {
        self.ctx.surface.render(&View::Walker(WalkerView {
            recent: self.recent.list(),
        }));
    }

    fn teardown(&mut self) {}

    fn handle_input(&mut self, input: ModuleInput) -> bool {
        match input {
            ModuleInput::RecordTarget {
                target,
                port,
                community,
                oid,
            } => {
                let _ = self.recent.record(RecentTarget {
                    target,
                    port,
                    community,
                    oid,
                    last_used: self.ctx.clock.now(),
                });
                self.render();
                true
            }
            ModuleInput::ClearHistory => {
                self.recent.clear();
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
    use crate::history::RECENT_TARGETS_KEY;
    use crate::modules::testing::harness;

    fn record(target: &str, oid: &str) -> ModuleInput {
        ModuleInput::RecordTarget {
            target: target.to_string(),
            port: 161,
            community: "public".to_string(),
            oid: oid.to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_moves_target_to_head() {
        let h = harness();
        let mut module = WalkerModule::new(h.ctx.clone());
        module.restore();

        assert!(module.handle_input(record("10.0.0.1", "1.3.6.1.2.1.1")));
        assert!(module.handle_input(record("10.0.0.2", "1.3.6.1.2.1.2")));
        assert!(module.handle_input(record("10.0.0.1", "1.3.6.1.2.1.1")));

        let Some(View::Walker(view)) = h.surface.last_render(RouteKey::Walker) else {
            panic!("expected a walker render");
        };
        let targets: Vec<&str> = view.recent.iter().map(|t| t.target.as_str()).collect();
        assert_eq!(targets, vec!["10.0.0.1", "10.0.0.2"]);
        assert!(h.storage.get_raw(RECENT_TARGETS_KEY).is_some());

        let mut reloaded = WalkerModule::new(h.ctx);
        reloaded.restore();
        assert_eq!(reloaded.recent.list().len(), 2);
    }

    #[tokio::test]
    async fn test_no_reseed_traffic() {
        let h = harness();
        let mut module = WalkerModule::new(h.ctx);
        module.reseed().await.unwrap();
        assert!(module.activate(&EventBus::new()).is_empty());
        assert!(h.http.requested_urls().is_empty());
    }
}
