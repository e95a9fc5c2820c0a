use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use treehouse_types::{ServiceStatus, StreamKind};

use crate::{
    events::{EventSender, ServiceEvents},
    process_manager::{CommandSpec, ProcessManager},
    supervisor::SupervisorConfig,
};

const EXIT_POLL: Duration = Duration::from_millis(100);

/// Owns one subprocess from launch to exit.
#[derive(Debug)]
pub struct ServiceSupervisor<P: ProcessManager> {
    config: SupervisorConfig,
    process_manager: P,
    events: ServiceEvents,
    status: Option<ServiceStatus>,
}

impl<P: ProcessManager> ServiceSupervisor<P> {
    pub fn new(config: SupervisorConfig, process_manager: P, events: &EventSender) -> Self {
        let events = events.for_service(&config.descriptor.name, &config.color);
        Self {
            config,
            process_manager,
            events,
            status: None,
        }
    }

    fn name(&self) -> &str {
        &self.config.descriptor.name
    }

    /// Runs the service until it exits, fails to launch, or `cancel` fires.
    ///
    /// Always returns a terminal status, and emits exactly one event for it.
    pub async fn start(mut self, cancel: CancellationToken) -> ServiceStatus {
        let spec = CommandSpec::shell(&self.config.descriptor);

        self.transition(ServiceStatus::Starting, None).await;

        let spawned = match self.process_manager.spawn(spec).await {
            Ok(spawned) => spawned,
            Err(err) => {
                tracing::warn!("Failed to launch `{}`: {err}", self.name());
                return self
                    .transition(ServiceStatus::Error, Some(err.to_string()))
                    .await;
            }
        };

        self.transition(
            ServiceStatus::Running,
            spawned.pid.map(|pid| format!("pid {pid}")),
        )
        .await;

        let id = spawned.id;
        let mut output = futures::stream::select(
            spawned.stdout.map(|line| (StreamKind::Stdout, line)),
            spawned.stderr.map(|line| (StreamKind::Stderr, line)),
        );
        let mut output_done = false;
        let mut ticker = tokio::time::interval(EXIT_POLL);
        let mut kill_deadline: Option<Instant> = None;
        let mut killed = false;

        let exit = loop {
            tokio::select! {
                () = cancel.cancelled(), if kill_deadline.is_none() => {
                    tracing::info!("Stopping `{}`", self.name());
                    if let Err(err) = self.process_manager.shutdown(id).await {
                        tracing::warn!("Failed to signal `{}`: {err}", self.name());
                    }
                    kill_deadline = Some(Instant::now() + self.config.grace_period);
                }
                line = output.next(), if !output_done => match line {
                    Some((stream, line)) => self.dispatch(stream, line).await,
                    None => output_done = true,
                },
                _ = ticker.tick() => {
                    match self.process_manager.wait(id, Duration::ZERO).await {
                        Ok(Some(code)) => break Ok(code),
                        Ok(None) => {}
                        Err(err) => break Err(err),
                    }

                    if !killed && kill_deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        tracing::warn!("`{}` ignored SIGTERM, killing", self.name());
                        if let Err(err) = self.process_manager.kill(id).await {
                            tracing::warn!("Failed to kill `{}`: {err}", self.name());
                        }
                        killed = true;
                    }
                }
            }
        };

        // Trailing lines may still sit in the pipes after the exit.
        let drain_timeout = self.config.drain_timeout;
        let drained = tokio::time::timeout(drain_timeout, async {
            while let Some((stream, line)) = output.next().await {
                self.dispatch(stream, line).await;
            }
        })
        .await;
        if drained.is_err() {
            tracing::debug!("Output of `{}` still open after exit", self.name());
        }

        let stopped = kill_deadline.is_some();
        match exit {
            Ok(_) if stopped => {
                self.transition(ServiceStatus::Exited, Some("stopped".to_owned()))
                    .await
            }
            Ok(0) => self.transition(ServiceStatus::Exited, None).await,
            Ok(code) => {
                self.transition(ServiceStatus::Crashed, Some(format!("exit code {code}")))
                    .await
            }
            Err(err) => {
                tracing::error!("Lost track of `{}`: {err}", self.name());
                self.transition(ServiceStatus::Crashed, Some(err.to_string()))
                    .await
            }
        }
    }

    async fn dispatch(&self, stream: StreamKind, line: String) {
        if self.config.filter.allows(self.name()) {
            self.events.log(line, stream).await;
        }
    }

    /// Records and reports a status change. Steps that would move backwards
    /// are dropped.
    async fn transition(&mut self, next: ServiceStatus, detail: Option<String>) -> ServiceStatus {
        let allowed = match self.status {
            None => next == ServiceStatus::Starting,
            Some(current) => current.can_transition_to(next),
        };
        if !allowed {
            tracing::error!(
                "Ignoring transition {:?} -> {next:?} for `{}`",
                self.status,
                self.name()
            );
            return self.status.unwrap_or(next);
        }

        tracing::debug!("`{}` is {}", self.name(), next.as_str());
        self.status = Some(next);
        self.events.status(next, detail).await;
        next
    }
}
