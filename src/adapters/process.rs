//! Runs the discovery command as a real subprocess.
//!
//! Output is captured in memory; nothing is written to disk, so concurrent
//! requests never share an artifact. On unix the command gets its own process
//! group, and the whole group is killed once the run is over, so pipelines
//! started by a wrapper script do not outlive it.

use crate::core::{CommandOutput, CommandRunner};
use crate::utils::error::{DiscoveryError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| DiscoveryError::MissingConfigError {
                field: "discovery.command".to_string(),
            })?;

        tracing::debug!("Running discovery command: {:?}", argv);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| DiscoveryError::Spawn {
            program: program.clone(),
            source,
        })?;
        // Dropped on every exit path, including a cancelled request.
        let mut group = ProcessGroup::new(child.id());

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let collected = tokio::time::timeout(timeout, async {
            tokio::try_join!(
                child.wait(),
                drain(stdout.as_mut(), &mut out),
                drain(stderr.as_mut(), &mut err),
            )
        })
        .await;

        match collected {
            Ok(Ok((status, _, _))) => Ok(CommandOutput {
                exit_code: status.code(),
                stdout: out,
                stderr: err,
            }),
            Ok(Err(source)) => Err(DiscoveryError::Spawn {
                program: program.clone(),
                source,
            }),
            Err(_) => {
                group.kill();
                if let Err(e) = child.kill().await {
                    tracing::debug!("Reaping timed out command '{}' failed: {}", program, e);
                }
                tracing::warn!("Discovery command '{}' timed out after {:?}, killed", program, timeout);
                Err(DiscoveryError::Timeout { timeout })
            }
        }
    }
}

async fn drain<R>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    if let Some(pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

/// The process group led by the spawned command. Killing it reaches
/// grandchildren that `kill_on_drop` alone would leave running.
struct ProcessGroup {
    pgid: Option<i32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };

        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
                // Group already empty.
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => tracing::warn!("Failed to kill process group {}: {}", pgid, e),
            }
        }
        #[cfg(not(unix))]
        let _ = pgid;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}
