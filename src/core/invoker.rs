use crate::core::{CommandOutput, CommandRunner};
use crate::utils::error::{DiscoveryError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Runs the configured discovery command once per call and hands back its stdout.
pub struct DiscoveryInvoker {
    runner: Arc<dyn CommandRunner>,
    argv: Vec<String>,
    timeout: Duration,
    // Present only in single-flight mode.
    slot: Option<Mutex<()>>,
}

impl DiscoveryInvoker {
    pub fn new(runner: Arc<dyn CommandRunner>, argv: Vec<String>, timeout: Duration) -> Self {
        Self {
            runner,
            argv,
            timeout,
            slot: None,
        }
    }

    /// Queue invocations so that at most one external process runs at a time.
    pub fn serialized(mut self) -> Self {
        self.slot = Some(Mutex::new(()));
        self
    }

    pub fn is_serialized(&self) -> bool {
        self.slot.is_some()
    }

    pub async fn invoke(&self) -> Result<String> {
        let output = match &self.slot {
            Some(slot) => {
                let _turn = slot.lock().await;
                self.runner.run(&self.argv, self.timeout).await?
            }
            None => self.runner.run(&self.argv, self.timeout).await?,
        };

        interpret(output)
    }
}

/// Exit status is checked before stderr; any non-blank stderr rejects the output.
fn interpret(output: CommandOutput) -> Result<String> {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.success() {
        return Err(DiscoveryError::NonZeroExit {
            code: output.exit_code,
            stderr,
        });
    }

    if !stderr.is_empty() {
        return Err(DiscoveryError::DiagnosticOutput { stderr });
    }

    Ok(String::from_utf8(output.stdout)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedRunner {
        output: CommandOutput,
        calls: AtomicUsize,
    }

    impl CannedRunner {
        fn new(exit_code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                output: CommandOutput {
                    exit_code,
                    stdout: stdout.to_vec(),
                    stderr: stderr.to_vec(),
                },
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CommandRunner for CannedRunner {
        async fn run(&self, _argv: &[String], _timeout: Duration) -> Result<CommandOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    struct TimingOutRunner;

    #[async_trait]
    impl CommandRunner for TimingOutRunner {
        async fn run(&self, _argv: &[String], timeout: Duration) -> Result<CommandOutput> {
            Err(DiscoveryError::Timeout { timeout })
        }
    }

    /// Tracks how many runs overlap.
    #[derive(Default)]
    struct OverlapRunner {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl CommandRunner for OverlapRunner {
        async fn run(&self, _argv: &[String], _timeout: Duration) -> Result<CommandOutput> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(CommandOutput {
                exit_code: Some(0),
                stdout: b"[]".to_vec(),
                stderr: Vec::new(),
            })
        }
    }

    fn invoker(runner: Arc<dyn CommandRunner>) -> DiscoveryInvoker {
        DiscoveryInvoker::new(runner, vec!["list-hosts".to_string()], Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_invoke_returns_stdout() {
        let runner = CannedRunner::new(Some(0), br#"[{"host":"grader-a.x.org"}]"#, b"");
        let out = invoker(runner.clone()).invoke().await.unwrap();

        assert_eq!(out, r#"[{"host":"grader-a.x.org"}]"#);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_process_error() {
        let runner = CannedRunner::new(Some(2), br#"[{"host":"grader-a"#, b"forbidden");
        let err = invoker(runner).invoke().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Process);
        match err {
            DiscoveryError::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signal_exit_is_process_error() {
        let runner = CannedRunner::new(None, b"", b"");
        let err = invoker(runner).invoke().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NonZeroExit { code: None, .. }));
    }

    #[tokio::test]
    async fn test_stderr_on_success_is_diagnostic_error() {
        let runner = CannedRunner::new(Some(0), b"[]", b"W1019 deprecated API\n");
        let err = invoker(runner).invoke().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Diagnostic);
        assert_eq!(err.user_friendly_message(), "Error retrieving services");
    }

    #[tokio::test]
    async fn test_blank_stderr_is_ignored() {
        let runner = CannedRunner::new(Some(0), b"[]", b"\n  \n");
        assert_eq!(invoker(runner).invoke().await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_non_utf8_stdout_is_read_error() {
        let runner = CannedRunner::new(Some(0), &[0x5b, 0xff, 0x5d], b"");
        let err = invoker(runner).invoke().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Read);
    }

    #[tokio::test]
    async fn test_timeout_propagates() {
        let err = invoker(Arc::new(TimingOutRunner)).invoke().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_serialized_invocations_do_not_overlap() {
        let runner = Arc::new(OverlapRunner::default());
        let invoker = Arc::new(invoker(runner.clone()).serialized());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let invoker = Arc::clone(&invoker);
                tokio::spawn(async move { invoker.invoke().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "[]");
        }

        assert_eq!(runner.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unserialized_invocations_run_concurrently() {
        let runner = Arc::new(OverlapRunner::default());
        let invoker = Arc::new(invoker(runner.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let invoker = Arc::clone(&invoker);
                tokio::spawn(async move { invoker.invoke().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(runner.peak.load(Ordering::SeqCst) > 1);
    }
}
