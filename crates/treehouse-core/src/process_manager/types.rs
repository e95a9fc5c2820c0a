use std::{fmt::Debug, path::PathBuf, pin::Pin};

use futures::Stream;
use treehouse_types::ServiceDescriptor;

pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Shell used to interpret service command lines.
pub const SHELL: [&str; 2] = ["sh", "-c"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub cmd: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Layered over the inherited environment of the orchestrator.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Runs the descriptor's command line through [`SHELL`].
    #[must_use]
    pub fn shell(descriptor: &ServiceDescriptor) -> Self {
        let mut cmd: Vec<String> = SHELL.iter().map(|s| (*s).to_owned()).collect();
        cmd.push(descriptor.command.clone());

        Self {
            name: descriptor.name.clone(),
            cmd,
            cwd: descriptor.cwd.clone(),
            env: descriptor
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProcId(pub u64);

/// A started process and its decoded output lines.
pub struct Spawned {
    pub id: ProcId,
    pub pid: Option<u32>,
    pub stdout: BoxStream<String>,
    pub stderr: BoxStream<String>,
}

impl Debug for Spawned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spawned")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("stdout", &"<stream>")
            .field("stderr", &"<stream>")
            .finish()
    }
}
