mod monitor;
mod probe;

pub use monitor::{HealthDefaults, HealthMonitor, DEFAULT_HEALTH_INTERVAL, DEFAULT_HEALTH_TIMEOUT};
pub use probe::HealthProbe;
