use std::{collections::BTreeMap, fmt, path::PathBuf};

/// A fully resolved service, ready to be launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    /// Shell command line, already resolved for the selected mode.
    pub command: String,
    /// Global environment merged with the service scope (service wins).
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub health: Option<HealthCheckSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckSpec {
    pub url: String,
    /// Accepted response codes. An empty list never matches.
    pub codes: Vec<u16>,
    /// Seconds between probes, `<= 0` means "use the default".
    pub interval_seconds: i64,
    /// Seconds before giving up, `<= 0` means "use the default".
    pub timeout_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    Starting,
    Running,
    Exited,
    Crashed,
    Error,
}

impl ServiceStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exited | Self::Crashed | Self::Error)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Starting, Self::Running | Self::Error)
                | (Self::Running, Self::Exited | Self::Crashed)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Exited => "Exited",
            Self::Crashed => "Crashed",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Pending,
    Healthy,
    Unhealthy,
    Aborted,
}

impl HealthStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Healthy => "Healthy",
            Self::Unhealthy => "Unhealthy",
            Self::Aborted => "Aborted",
        }
    }
}

/// Either kind of transition carried by a [`StatusEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Process(ServiceStatus),
    Health(HealthStatus),
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Process(status) => status.as_str(),
            Self::Health(status) => status.as_str(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ServiceStatus> for Status {
    fn from(status: ServiceStatus) -> Self {
        Self::Process(status)
    }
}

impl From<HealthStatus> for Status {
    fn from(status: HealthStatus) -> Self {
        Self::Health(status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub service: String,
    pub line: String,
    pub color: String,
    pub stream: StreamKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub service: String,
    pub status: Status,
    pub color: String,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Log(LogEvent),
    Status(StatusEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_transitions_only_move_forward() {
        use ServiceStatus::*;

        assert!(Starting.can_transition_to(Running));
        assert!(Starting.can_transition_to(Error));
        assert!(Running.can_transition_to(Exited));
        assert!(Running.can_transition_to(Crashed));

        assert!(!Running.can_transition_to(Starting));
        assert!(!Starting.can_transition_to(Exited));
        assert!(!Running.can_transition_to(Error));
        for terminal in [Exited, Crashed, Error] {
            assert!(terminal.is_terminal());
            for next in [Starting, Running, Exited, Crashed, Error] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_tokens() {
        assert_eq!(Status::from(ServiceStatus::Crashed).to_string(), "Crashed");
        assert_eq!(Status::from(HealthStatus::Aborted).to_string(), "Aborted");
        assert!(!HealthStatus::Pending.is_terminal());
        assert!(HealthStatus::Unhealthy.is_terminal());
    }
}
