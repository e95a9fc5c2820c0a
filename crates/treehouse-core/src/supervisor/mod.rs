mod config;
mod service;

pub use config::{SupervisorConfig, DEFAULT_DRAIN_TIMEOUT, DEFAULT_GRACE_PERIOD};
pub use service::ServiceSupervisor;
