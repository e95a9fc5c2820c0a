use std::time::Duration;

use treehouse_types::ServiceDescriptor;

use crate::filter::StreamFilter;

/// Time between SIGTERM and SIGKILL when a run is cancelled.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);
/// How long to keep reading output after the process has exited.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything a [`ServiceSupervisor`](super::ServiceSupervisor) needs, set up
/// front.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub descriptor: ServiceDescriptor,
    pub filter: StreamFilter,
    pub color: String,
    pub grace_period: Duration,
    pub drain_timeout: Duration,
}

impl SupervisorConfig {
    #[must_use]
    pub fn new(descriptor: ServiceDescriptor, filter: StreamFilter, color: String) -> Self {
        Self {
            descriptor,
            filter,
            color,
            grace_period: DEFAULT_GRACE_PERIOD,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}
