use std::{io::Write, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use treehouse_core::{
    events::{self, pump},
    HealthDefaults, Orchestrator, OrchestratorOptions, RunReport, UnixProcessManager,
};

use crate::{config::GlobalArgs, logger::Logger};

/// Exit status used when a second Ctrl+C skips the graceful shutdown.
const INTERRUPTED: i32 = 130;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config_dir: PathBuf,
    pub mode: String,
    /// Services started on top of the core ones.
    pub extra: Vec<String>,
    pub orchestrator: OrchestratorOptions,
}

impl RunOptions {
    /// `spm` names the single service to focus on, if any.
    pub fn new(global: GlobalArgs, spm: Option<String>) -> Self {
        let mut health = HealthDefaults::default();
        if let Some(secs) = global.health_interval.filter(|s| *s > 0) {
            health.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = global.health_timeout.filter(|s| *s > 0) {
            health.timeout = Duration::from_secs(secs);
        }

        let single_process_mode = spm.is_some();
        let focus = spm.clone().or(global.focus);

        Self {
            config_dir: global.config_dir,
            mode: global.mode,
            extra: spm.into_iter().collect(),
            orchestrator: OrchestratorOptions {
                focus,
                mute: global.mute,
                health,
                single_process_mode,
                ..Default::default()
            },
        }
    }
}

pub async fn run(options: RunOptions) -> Result<()> {
    let cancel = CancellationToken::new();
    tokio::spawn(watch_ctrl_c(cancel.clone()));

    let (report, _) = execute(options, Logger::stdout(), &cancel).await?;
    tracing::debug!("Run finished: {report:?}");

    Ok(())
}

async fn watch_ctrl_c(cancel: CancellationToken) {
    if signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to listen for Ctrl+C");
        return;
    }
    tracing::warn!("Ctrl+C: stopping services...");
    cancel.cancel();

    if signal::ctrl_c().await.is_ok() {
        tracing::warn!("Second Ctrl+C: exiting immediately");
        std::process::exit(INTERRUPTED);
    }
}

/// Loads the config, runs every resolved service and prints their events
/// through `logger` until all of them are done.
pub async fn execute<W>(
    options: RunOptions,
    logger: Logger<W>,
    cancel: &CancellationToken,
) -> Result<(RunReport, Logger<W>)>
where
    W: Write + Send + 'static,
{
    let config = treehouse_config::load_from_dir(&options.config_dir).with_context(|| {
        format!(
            "failed to load config from {}",
            options.config_dir.display()
        )
    })?;
    let descriptors = config
        .resolve(&options.mode, &options.extra)
        .context("failed to resolve services")?;
    if descriptors.is_empty() {
        tracing::warn!("No services to run");
    }

    let (tx, rx) = events::channel();
    let printer = tokio::spawn(async move {
        let mut logger = logger;
        pump(rx, &mut logger).await;
        logger
    });

    let orchestrator = Orchestrator::<UnixProcessManager>::new(options.orchestrator);
    let report = orchestrator.run(descriptors, &tx, cancel).await;
    drop(tx);

    let mut logger = printer.await.context("printer task failed")?;
    logger.system("All services stopped");

    Ok((report, logger))
}
