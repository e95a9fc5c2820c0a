mod error;
pub mod events;
mod filter;
pub mod health;
mod orchestrator;
pub mod process_manager;
pub mod supervisor;

pub use error::{Error, Result};
pub use events::{EventSender, EventSink};
pub use filter::StreamFilter;
pub use health::{HealthDefaults, HealthMonitor, HealthProbe};
pub use orchestrator::{
    Orchestrator, OrchestratorOptions, RunReport, ServiceReport, DEFAULT_PALETTE,
};
#[cfg(unix)]
pub use process_manager::UnixProcessManager;
pub use process_manager::{CommandSpec, ProcessManager};
pub use supervisor::{ServiceSupervisor, SupervisorConfig};
pub use treehouse_types as types;
