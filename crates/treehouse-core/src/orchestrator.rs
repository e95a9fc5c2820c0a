use std::marker::PhantomData;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use treehouse_types::{HealthStatus, ServiceDescriptor, ServiceStatus};

use crate::{
    events::EventSender,
    filter::StreamFilter,
    health::{HealthDefaults, HealthMonitor},
    process_manager::ProcessManager,
    supervisor::{ServiceSupervisor, SupervisorConfig},
};

/// Colors handed out to services in order.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "green",
    "blue",
    "magenta",
    "cyan",
    "bright green",
    "bright blue",
    "bright magenta",
    "bright cyan",
];

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub focus: Option<String>,
    pub mute: Option<String>,
    pub palette: Vec<String>,
    pub health: HealthDefaults,
    /// Only the focused service gets a health monitor.
    pub single_process_mode: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            focus: None,
            mute: None,
            palette: DEFAULT_PALETTE.iter().map(|c| (*c).to_owned()).collect(),
            health: HealthDefaults::default(),
            single_process_mode: false,
        }
    }
}

impl OrchestratorOptions {
    fn color(&self, index: usize) -> String {
        if self.palette.is_empty() {
            return String::new();
        }
        self.palette[index % self.palette.len()].clone()
    }

    fn monitors(&self, descriptor: &ServiceDescriptor) -> bool {
        if descriptor.health.is_none() {
            return false;
        }
        !self.single_process_mode || self.focus.as_deref() == Some(descriptor.name.as_str())
    }
}

/// Terminal outcome of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    pub name: String,
    pub status: ServiceStatus,
    /// `None` when the service was not monitored.
    pub health: Option<HealthStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub services: Vec<ServiceReport>,
}

impl RunReport {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServiceReport> {
        self.services.iter().find(|s| s.name == name)
    }

    /// True when no service crashed or failed to launch.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.services
            .iter()
            .all(|s| s.status == ServiceStatus::Exited)
    }
}

/// Runs a set of services side by side until every one of them is done.
#[derive(Debug)]
pub struct Orchestrator<P> {
    options: OrchestratorOptions,
    client: reqwest::Client,
    _process_manager: PhantomData<fn() -> P>,
}

impl<P> Orchestrator<P>
where
    P: ProcessManager + Default + 'static,
{
    #[must_use]
    pub fn new(options: OrchestratorOptions) -> Self {
        Self {
            options,
            client: reqwest::Client::new(),
            _process_manager: PhantomData,
        }
    }

    #[must_use]
    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Starts every descriptor, then waits for all health monitors and all
    /// supervisors to finish.
    ///
    /// Each supervisor owns its own process manager. Cancelling `cancel`
    /// stops every process and aborts every pending health check.
    pub async fn run(
        &self,
        descriptors: Vec<ServiceDescriptor>,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> RunReport {
        let filter = StreamFilter::new(self.options.focus.clone(), self.options.mute.clone());

        let mut supervisors: Vec<(String, JoinHandle<ServiceStatus>)> =
            Vec::with_capacity(descriptors.len());
        let mut monitors: Vec<(String, JoinHandle<HealthStatus>)> = Vec::new();

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let name = descriptor.name.clone();
            let color = self.options.color(index);

            if self.options.monitors(&descriptor) {
                if let Some(spec) = &descriptor.health {
                    let monitor = HealthMonitor::new(
                        &name,
                        &color,
                        spec,
                        self.options.health,
                        self.client.clone(),
                        events,
                    );
                    monitors.push((name.clone(), tokio::spawn(monitor.watch(cancel.clone()))));
                }
            }

            let config = SupervisorConfig::new(descriptor, filter.clone(), color);
            let supervisor = ServiceSupervisor::new(config, P::default(), events);
            tracing::debug!("Starting `{name}`");
            supervisors.push((name, tokio::spawn(supervisor.start(cancel.clone()))));
        }

        let mut health = Vec::with_capacity(monitors.len());
        for (name, task) in monitors {
            match task.await {
                Ok(status) => health.push((name, status)),
                Err(err) => tracing::error!("Health monitor for `{name}` failed: {err}"),
            }
        }

        let mut report = RunReport::default();
        for (name, task) in supervisors {
            let status = task.await.unwrap_or_else(|err| {
                tracing::error!("Supervisor for `{name}` failed: {err}");
                ServiceStatus::Error
            });
            let health = health
                .iter()
                .find(|(monitored, _)| *monitored == name)
                .map(|(_, status)| *status);
            report.services.push(ServiceReport {
                name,
                status,
                health,
            });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use treehouse_types::HealthCheckSpec;

    use super::*;

    fn descriptor(name: &str, health: bool) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_owned(),
            command: "true".to_owned(),
            env: BTreeMap::new(),
            cwd: None,
            health: health.then(|| HealthCheckSpec {
                url: "http://localhost/health".to_owned(),
                codes: vec![200],
                interval_seconds: 1,
                timeout_seconds: 1,
            }),
        }
    }

    #[test]
    fn test_palette_round_robin() {
        let options = OrchestratorOptions {
            palette: vec!["red".to_owned(), "blue".to_owned()],
            ..Default::default()
        };
        let colors: Vec<_> = (0..5).map(|i| options.color(i)).collect();
        assert_eq!(colors, vec!["red", "blue", "red", "blue", "red"]);

        let empty = OrchestratorOptions {
            palette: Vec::new(),
            ..Default::default()
        };
        assert_eq!(empty.color(3), "");
    }

    #[test]
    fn test_monitors_every_health_check() {
        let options = OrchestratorOptions::default();
        assert!(options.monitors(&descriptor("api", true)));
        assert!(!options.monitors(&descriptor("web", false)));
    }

    #[test]
    fn test_single_process_mode_monitors_focus_only() {
        let options = OrchestratorOptions {
            focus: Some("api".to_owned()),
            single_process_mode: true,
            ..Default::default()
        };
        assert!(options.monitors(&descriptor("api", true)));
        assert!(!options.monitors(&descriptor("db", true)));
    }

    #[test]
    fn test_report_success() {
        let mut report = RunReport {
            services: vec![ServiceReport {
                name: "api".to_owned(),
                status: ServiceStatus::Exited,
                health: Some(HealthStatus::Healthy),
            }],
        };
        assert!(report.is_success());
        assert_eq!(report.get("api").and_then(|s| s.health), Some(HealthStatus::Healthy));

        report.services.push(ServiceReport {
            name: "web".to_owned(),
            status: ServiceStatus::Crashed,
            health: None,
        });
        assert!(!report.is_success());
        assert!(report.get("db").is_none());
    }
}
