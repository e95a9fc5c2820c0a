use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use treehouse_types::{HealthCheckSpec, HealthStatus};

use crate::{
    events::{EventSender, ServiceEvents},
    health::HealthProbe,
};

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide fallbacks for specs that leave interval or timeout unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthDefaults {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for HealthDefaults {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEALTH_INTERVAL,
            timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }
}

fn seconds_or(value: i64, default: Duration) -> Duration {
    u64::try_from(value)
        .ok()
        .filter(|secs| *secs > 0)
        .map_or(default, Duration::from_secs)
}

/// Polls one endpoint until it answers with an accepted code, the timeout
/// runs out, or the run is cancelled.
#[derive(Debug)]
pub struct HealthMonitor<C: HealthProbe> {
    url: String,
    codes: Vec<u16>,
    interval: Duration,
    timeout: Duration,
    client: C,
    events: ServiceEvents,
}

impl<C: HealthProbe> HealthMonitor<C> {
    pub fn new(
        service: &str,
        color: &str,
        spec: &HealthCheckSpec,
        defaults: HealthDefaults,
        client: C,
        events: &EventSender,
    ) -> Self {
        Self {
            url: spec.url.clone(),
            codes: spec.codes.clone(),
            interval: seconds_or(spec.interval_seconds, defaults.interval),
            timeout: seconds_or(spec.timeout_seconds, defaults.timeout),
            client,
            events: events.for_service(service, color),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes until a terminal status is reached and reports it.
    ///
    /// Failed probes (network errors and unexpected codes alike) are never
    /// reported on their own. The timeout is only checked after a probe, so
    /// a slow last probe still gets evaluated. A request may run until the
    /// overall timeout, and never for less than one interval, which keeps
    /// the worst case at `timeout + interval`.
    pub async fn watch(self, cancel: CancellationToken) -> HealthStatus {
        let start = Instant::now();
        let service = self.events.service().to_owned();

        loop {
            if cancel.is_cancelled() {
                tracing::debug!("Health check for `{service}` aborted");
                self.events.status(HealthStatus::Aborted, None).await;
                return HealthStatus::Aborted;
            }

            let budget = self.interval.max(self.timeout.saturating_sub(start.elapsed()));
            match self.client.probe(&self.url, budget).await {
                Ok(code) if self.codes.contains(&code) => {
                    tracing::info!("`{service}` is healthy ({code})");
                    self.events
                        .status(HealthStatus::Healthy, Some(code.to_string()))
                        .await;
                    return HealthStatus::Healthy;
                }
                Ok(code) => tracing::trace!("`{service}` answered {code}"),
                Err(err) => tracing::trace!("`{service}` probe failed: {err}"),
            }

            if start.elapsed() >= self.timeout {
                tracing::info!("`{service}` did not become healthy in {:?}", self.timeout);
                self.events
                    .status(HealthStatus::Unhealthy, Some("timeout".to_owned()))
                    .await;
                return HealthStatus::Unhealthy;
            }

            tokio::select! {
                () = cancel.cancelled() => {}
                () = sleep(self.interval) => {}
            }
        }
    }
}
