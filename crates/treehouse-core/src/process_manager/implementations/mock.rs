use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    process_manager::{CommandSpec, ProcId, ProcessManager, Spawned},
};

/// Plays back a scripted process.
#[derive(Debug, Default)]
pub struct MockProcessManager {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    /// `None` keeps the process "running" until it is shut down.
    pub exit_code: Option<i32>,
    /// Exit code taken on SIGTERM, 143 when unset.
    pub term_exit_code: Option<i32>,
    pub fail_spawn: bool,

    pub spawned: Vec<CommandSpec>,
    pub signals: Vec<&'static str>,
}

impl MockProcessManager {
    pub fn exiting(code: i32, stdout: &[&str]) -> Self {
        Self {
            stdout: stdout.iter().map(|s| (*s).to_owned()).collect(),
            exit_code: Some(code),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ProcessManager for MockProcessManager {
    async fn spawn(&mut self, spec: CommandSpec) -> Result<Spawned> {
        if self.fail_spawn {
            return Err(Error::IOError(std::io::Error::from(
                std::io::ErrorKind::NotFound,
            )));
        }
        self.spawned.push(spec);
        Ok(Spawned {
            id: ProcId(0),
            pid: Some(4242),
            stdout: Box::pin(futures::stream::iter(self.stdout.clone())),
            stderr: Box::pin(futures::stream::iter(self.stderr.clone())),
        })
    }
    async fn shutdown(&mut self, _id: ProcId) -> Result<()> {
        self.signals.push("TERM");
        self.exit_code
            .get_or_insert(self.term_exit_code.unwrap_or(143));
        Ok(())
    }
    async fn wait(&mut self, _id: ProcId, _d: Duration) -> Result<Option<i32>> {
        Ok(self.exit_code)
    }
    async fn kill(&mut self, _id: ProcId) -> Result<()> {
        self.signals.push("KILL");
        self.exit_code.get_or_insert(137);
        Ok(())
    }
}
