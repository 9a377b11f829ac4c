//! Render snapshots handed to the [`Surface`](crate::traits::Surface).

use std::fmt;

use serde_json::Value;

use super::browser::BrowserState;
use crate::history::RecentTarget;
use crate::models::{LogLine, MibModule, ReceiverStatus, SimulatorStatus, TrapRecord};
use crate::router::RouteKey;

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard(DashboardView),
    Simulator(SimulatorView),
    Traps(TrapsView),
    Walker(WalkerView),
    Browser(BrowserView),
}

impl View {
    pub fn route(&self) -> RouteKey {
        match self {
            View::Dashboard(_) => RouteKey::Dashboard,
            View::Simulator(_) => RouteKey::Simulator,
            View::Traps(_) => RouteKey::Traps,
            View::Walker(_) => RouteKey::Walker,
            View::Browser(_) => RouteKey::Browser,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub simulator: Option<SimulatorStatus>,
    pub receiver: Option<ReceiverStatus>,
    pub stats: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatorView {
    pub status: Option<SimulatorStatus>,
    /// Most recent first
    pub logs: Vec<LogLine>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrapsView {
    pub receiver: Option<ReceiverStatus>,
    /// Most recent first
    pub traps: Vec<TrapRecord>,
    pub total: usize,
    pub latest: Option<TrapRecord>,
    /// Host sending the most traps, with its count
    pub top_source: Option<(String, usize)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkerView {
    pub recent: Vec<RecentTarget>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowserView {
    pub modules: Vec<MibModule>,
    pub state: BrowserState,
}

fn running(flag: bool) -> &'static str {
    if flag {
        "running"
    } else {
        "stopped"
    }
}

fn port(port: Option<u16>) -> String {
    port.map_or_else(|| "-".to_string(), |p| p.to_string())
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.route())?;
        match self {
            View::Dashboard(v) => {
                match &v.simulator {
                    Some(s) => writeln!(f, "simulator: {} (port {})", running(s.running), port(s.port))?,
                    None => writeln!(f, "simulator: unknown")?,
                }
                match &v.receiver {
                    Some(r) => writeln!(f, "receiver:  {} (port {})", running(r.running), port(r.port))?,
                    None => writeln!(f, "receiver:  unknown")?,
                }
                if let Some(stats) = &v.stats {
                    write!(f, "stats:     {}", stats)?;
                }
                Ok(())
            }
            View::Simulator(v) => {
                if let Some(s) = &v.status {
                    writeln!(
                        f,
                        "{} on port {}, uptime {}",
                        running(s.running),
                        port(s.port),
                        s.uptime.as_deref().unwrap_or("-")
                    )?;
                }
                for line in v.logs.iter().take(10) {
                    writeln!(f, "  [{}] {}", line.level, line.message)?;
                }
                write!(f, "{} log lines", v.logs.len())
            }
            View::Traps(v) => {
                if let Some(r) = &v.receiver {
                    writeln!(f, "receiver {} on port {}", running(r.running), port(r.port))?;
                }
                if let Some((host, count)) = &v.top_source {
                    writeln!(f, "top source: {} ({})", host, count)?;
                }
                for trap in v.traps.iter().take(10) {
                    writeln!(
                        f,
                        "  {} {} {}",
                        trap.time_str,
                        trap.source,
                        trap.trap_type.as_deref().unwrap_or("?")
                    )?;
                }
                write!(f, "{} traps", v.total)
            }
            View::Walker(v) => {
                for t in &v.recent {
                    writeln!(f, "  {}:{} {} ({})", t.target, t.port, t.oid, t.community)?;
                }
                write!(f, "{} recent targets", v.recent.len())
            }
            View::Browser(v) => {
                if v.state.search_active {
                    writeln!(f, "search: {}", v.state.search_query)?;
                }
                if let Some(oid) = &v.state.selected_oid {
                    writeln!(f, "selected: {}", oid)?;
                }
                for module in &v.modules {
                    writeln!(f, "  {} ({} objects)", module.name, module.objects)?;
                }
                write!(f, "{} MIB modules", v.modules.len())
            }
        }
    }
}
