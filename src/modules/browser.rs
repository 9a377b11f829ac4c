//! MIB browser. Its tree position and filters survive navigation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::view::{BrowserView, View};
use super::{lock, ModuleContext};
use crate::error::ApiError;
use crate::events::{EventBus, Subscription};
use crate::history::UiStateStore;
use crate::models::MibModule;
use crate::router::{Module, ModuleInput, RouteKey, TaskSet};

pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(300);

const STATE_NAME: &str = "browser";

/// Saved browser UI state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserState {
    /// `module` for the tree, `search` for results
    pub current_view: String,
    pub current_module: Option<String>,
    pub current_type_filter: Option<String>,
    pub search_query: String,
    #[serde(rename = "isSearchActive")]
    pub search_active: bool,
    pub expanded_nodes: Vec<String>,
    pub selected_oid: Option<String>,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self {
            current_view: "module".to_string(),
            current_module: None,
            current_type_filter: None,
            search_query: String::new(),
            search_active: false,
            expanded_nodes: Vec::new(),
            selected_oid: None,
        }
    }
}

impl BrowserState {
    /// Apply `input`, returning whether anything changed, or `None` if the
    /// input is not a browser interaction.
    fn apply(&mut self, input: ModuleInput) -> Option<bool> {
        let before = self.clone();
        match input {
            ModuleInput::Search(query) => {
                let query = query.trim().to_string();
                self.search_active = !query.is_empty();
                self.current_view = if self.search_active { "search" } else { "module" }.to_string();
                self.search_query = query;
            }
            ModuleInput::FilterModule(module) => {
                self.current_module = module.filter(|m| !m.is_empty());
                self.expanded_nodes.clear();
            }
            ModuleInput::FilterType(kind) => self.current_type_filter = kind.filter(|k| !k.is_empty()),
            ModuleInput::ExpandNode(oid) => {
                if !self.expanded_nodes.contains(&oid) {
                    self.expanded_nodes.push(oid);
                }
            }
            ModuleInput::CollapseNode(oid) => self.expanded_nodes.retain(|n| n != &oid),
            ModuleInput::SelectNode(oid) => self.selected_oid = Some(oid),
            _ => return None,
        }
        Some(*self != before)
    }
}

pub struct BrowserModule {
    ctx: ModuleContext,
    ui: UiStateStore,
    state: Arc<Mutex<BrowserState>>,
    modules: Vec<MibModule>,
    tasks: TaskSet,
    debounce: Duration,
}

impl BrowserModule {
    pub fn new(ctx: ModuleContext) -> Self {
        let ui = UiStateStore::new(Arc::clone(&ctx.storage));
        Self {
            ctx,
            ui,
            state: Arc::default(),
            modules: Vec::new(),
            tasks: TaskSet::new(),
            debounce: SAVE_DEBOUNCE,
        }
    }

    pub fn state(&self) -> BrowserState {
        lock(&self.state).clone()
    }

    fn save_now(&self) {
        let state = lock(&self.state).clone();
        let _ = self.ui.save(STATE_NAME, &state);
    }

    /// Save once input has been quiet for the debounce period.
    fn schedule_save(&mut self) {
        let ui = self.ui.clone();
        let state = Arc::clone(&self.state);
        let delay = self.debounce;
        let gate = self.tasks.gate();
        self.tasks.spawn("save_state", async move {
            tokio::time::sleep(delay).await;
            let Some(_open) = gate.enter() else { return };
            let snapshot = lock(&state).clone();
            if ui.save(STATE_NAME, &snapshot).is_ok() {
                debug!("browser state saved");
            }
        });
    }
}

#[async_trait]
impl Module for BrowserModule {
    fn route(&self) -> RouteKey {
        RouteKey::Browser
    }

    fn restore(&mut self) {
        if let Some(saved) = self.ui.load::<BrowserState>(STATE_NAME) {
            *lock(&self.state) = saved;
        }
    }

    async fn reseed(&mut self) -> Result<(), ApiError> {
        self.modules = self.ctx.api.mib_modules().await?;
        Ok(())
    }

    fn activate(&mut self, _bus: &EventBus) -> Vec<Subscription> {
        Vec::new()
    }

    fn render(&self) {
        self.ctx.surface.render(&View::Browser(BrowserView {
            modules: self.modules.clone(),
            state: self.state(),
        }));
    }

    fn teardown(&mut self) {
        self.tasks.cancel_all();
        self.save_now();
    }

    fn handle_input(&mut self, input: ModuleInput) -> bool {
        let applied = lock(&self.state).apply(input);
        match applied {
            None => false,
            Some(changed) => {
                if changed {
                    self.schedule_save();
                    self.render();
                }
                true
            }
        }
    }
}
