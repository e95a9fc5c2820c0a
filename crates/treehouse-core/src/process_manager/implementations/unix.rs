use std::{os::unix::process::ExitStatusExt, process::ExitStatus, time::Duration};

use futures::StreamExt;
use libc::{killpg, setsid, ESRCH, SIGKILL, SIGTERM};
use tokio::{
    io::AsyncRead,
    process::{Child, Command},
    time::{sleep, Instant},
};
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};

use crate::{
    error::{Error, Result},
    process_manager::{
        base::ProcessManager,
        types::{BoxStream, CommandSpec, ProcId, Spawned},
    },
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct ChildRec {
    child: Child,
    pgid: libc::pid_t,
}

/// Unix-specific process manager.
///
/// Every child becomes the leader of its own session so that signals reach
/// the whole process group (`sh -c` plus whatever it started).
#[derive(Debug)]
pub struct UnixProcessManager {
    processes: Vec<Option<ChildRec>>,
}

impl Default for UnixProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UnixProcessManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
        }
    }

    fn record(&mut self, id: ProcId) -> Result<&mut ChildRec> {
        let index = usize::try_from(id.0).map_err(|_| Error::UnknownProcess(id.0))?;
        self.processes
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownProcess(id.0))
    }

    fn signal_group(&mut self, id: ProcId, signal: libc::c_int) -> Result<()> {
        let pgid = self.record(id)?.pgid;

        #[allow(unsafe_code)]
        unsafe {
            let rc = killpg(pgid, signal);
            if rc == -1 {
                let err = std::io::Error::last_os_error();
                // The group is already gone, nothing left to signal.
                if err.raw_os_error() == Some(ESRCH) {
                    return Ok(());
                }
                return Err(Error::IOError(err));
            }
        }

        Ok(())
    }
}

/// Splits a pipe into lines, replacing invalid UTF-8 and dropping the `\r` of
/// CRLF endings.
fn lines<R>(reader: R) -> BoxStream<String>
where
    R: AsyncRead + Send + 'static,
{
    let codec = AnyDelimiterCodec::new(b"\n".to_vec(), Vec::new());
    let stream = FramedRead::new(reader, codec).filter_map(|res| async move {
        res.ok().map(|bytes| {
            let line = String::from_utf8_lossy(&bytes);
            line.strip_suffix('\r').unwrap_or(&*line).to_owned()
        })
    });

    Box::pin(stream)
}

/// Exit code of a finished process. Signal deaths map to `128 + signal`,
/// as shells report them.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ProcessManager for UnixProcessManager {
    async fn spawn(&mut self, spec: CommandSpec) -> Result<Spawned> {
        let Some((program, args)) = spec.cmd.split_first() else {
            return Err(Error::EmptyCommand(spec.name));
        };
        super::program::check(&spec)?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(|| {
                if setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(Error::IOError)?;

        let pid = child.id();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::IOError(std::io::Error::other("stdout not piped")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::IOError(std::io::Error::other("stderr not piped")))?;

        let pgid = pid
            .and_then(|pid| libc::pid_t::try_from(pid).ok())
            .ok_or_else(|| Error::IOError(std::io::Error::other("pid not available")))?;

        let id = ProcId(self.processes.len() as u64);
        self.processes.push(Some(ChildRec { child, pgid }));

        tracing::debug!("Spawned `{}` with pid {pgid}", spec.name);

        Ok(Spawned {
            id,
            pid,
            stdout: lines(stdout),
            stderr: lines(stderr),
        })
    }

    async fn shutdown(&mut self, id: ProcId) -> Result<()> {
        self.signal_group(id, SIGTERM)
    }

    async fn wait(&mut self, id: ProcId, d: Duration) -> Result<Option<i32>> {
        let start = Instant::now();
        loop {
            let proc = self.record(id)?;
            if let Some(status) = proc.child.try_wait()? {
                let index = usize::try_from(id.0).map_err(|_| Error::UnknownProcess(id.0))?;
                self.processes[index] = None;
                return Ok(Some(exit_code(status)));
            }

            if start.elapsed() >= d {
                return Ok(None);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn kill(&mut self, id: ProcId) -> Result<()> {
        self.signal_group(id, SIGKILL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_split_and_trim_cr() {
        let input: &[u8] = b"first\r\nsecond\n\xffbad\nlast";
        let collected: Vec<String> = lines(input).collect().await;

        assert_eq!(collected, vec!["first", "second", "\u{fffd}bad", "last"]);
    }

    #[tokio::test]
    async fn test_unknown_process() {
        let mut pm = UnixProcessManager::new();
        assert!(matches!(
            pm.wait(ProcId(3), Duration::ZERO).await,
            Err(Error::UnknownProcess(3))
        ));
    }

    #[tokio::test]
    async fn test_empty_command() {
        let mut pm = UnixProcessManager::new();
        let result = pm
            .spawn(CommandSpec {
                name: "empty".to_owned(),
                cmd: vec![],
                cwd: None,
                env: vec![],
            })
            .await;
        assert!(matches!(result, Err(Error::EmptyCommand(_))));
    }
}
