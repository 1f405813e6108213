use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::worker::outcome::{self, WorkerOutcome};

/// Launches the external scoring process and turns one run into exactly one
/// `WorkerOutcome`.
///
/// Per invocation: spawn `<bin> <script> <upload_path>`, then drive a
/// single explicit join of three completions (stdout drain, stderr drain,
/// process exit) under the configured timeout. No outcome is produced
/// before all three resolve (or the timeout kills the child).
pub struct WorkerInvoker {
    bin: String,
    script: PathBuf,
    timeout: Duration,
}

impl WorkerInvoker {
    pub fn new(bin: impl Into<String>, script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            script: script.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.worker_bin.clone(),
            config.worker_script.clone(),
            config.worker_timeout,
        )
    }

    pub async fn invoke(&self, upload_path: &Path) -> WorkerOutcome {
        info!(path = %upload_path.display(), "invoking scoring worker");

        let mut child = match Command::new(&self.bin)
            .arg(&self.script)
            .arg(upload_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!(bin = %self.bin, error = %e, "failed to start worker");
                return WorkerOutcome::LaunchFailure(e.to_string());
            }
        };

        // Both pipes exist because both were requested above.
        let Some(mut stdout_pipe) = child.stdout.take() else {
            return WorkerOutcome::LaunchFailure("worker stdout was not captured".to_string());
        };
        let Some(mut stderr_pipe) = child.stderr.take() else {
            return WorkerOutcome::LaunchFailure("worker stderr was not captured".to_string());
        };

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        // Both streams are drained fully and independently, joined with the
        // exit event; dropping this future on timeout releases the child
        // for the kill below.
        let drained = async {
            let (out_res, err_res, status) = tokio::join!(
                stdout_pipe.read_to_end(&mut stdout_buf),
                stderr_pipe.read_to_end(&mut stderr_buf),
                child.wait(),
            );
            if let Err(e) = out_res {
                warn!(error = %e, "worker stdout drain failed");
            }
            if let Err(e) = err_res {
                warn!(error = %e, "worker stderr drain failed");
            }
            status
        };

        let status = match tokio::time::timeout(self.timeout, drained).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                error!(error = %e, "failed waiting for worker exit");
                return WorkerOutcome::LaunchFailure(format!("wait failed: {e}"));
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "worker exceeded timeout, killing");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill timed-out worker");
                }
                return WorkerOutcome::Timeout(self.timeout);
            }
        };

        let stdout = String::from_utf8_lossy(&stdout_buf);
        let stderr = String::from_utf8_lossy(&stderr_buf);

        info!(
            exit_code = status.code(),
            stdout_bytes = stdout_buf.len(),
            stderr_bytes = stderr_buf.len(),
            "worker exited"
        );
        if !stderr.is_empty() {
            warn!(stderr = %stderr, "worker diagnostics");
        }

        outcome::resolve_exit(status.code(), &stdout, &stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds an invoker whose "worker" is a shell script, exercised the
    /// same way the real one is: `sh <script> <upload_path>`.
    fn stub_invoker(dir: &Path, script_body: &str, timeout: Duration) -> WorkerInvoker {
        let script = dir.join("stub.sh");
        std::fs::write(&script, script_body).unwrap();
        WorkerInvoker::new("sh", script, timeout)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test]
    async fn test_success_with_valid_array() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = stub_invoker(
            dir.path(),
            r#"echo '[{"title":"X","location":"Y","match_score":90}]'"#,
            secs(10),
        );
        match invoker.invoke(Path::new("/dev/null")).await {
            WorkerOutcome::Success(jobs) => {
                assert_eq!(jobs.len(), 1);
                assert_eq!(jobs[0].title, "X");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_path_is_sole_positional_argument() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("stored-upload");
        std::fs::write(
            &upload,
            r#"[{"title":"From Upload","location":"Here","match_score":77}]"#,
        )
        .unwrap();

        // The stub just replays the file it was pointed at.
        let invoker = stub_invoker(dir.path(), r#"cat "$1""#, secs(10));
        match invoker.invoke(&upload).await {
            WorkerOutcome::Success(jobs) => assert_eq!(jobs[0].title, "From Upload"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_first_stderr_line() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = stub_invoker(
            dir.path(),
            "echo 'Traceback (most recent call last):' >&2\n\
             echo \"KeyError: 'skills'\" >&2\n\
             exit 1\n",
            secs(10),
        );
        assert_eq!(
            invoker.invoke(Path::new("/dev/null")).await,
            WorkerOutcome::ProcessFailure {
                exit_code: 1,
                stderr_excerpt: "Traceback (most recent call last):".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_exit_zero_with_garbage_stdout_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = stub_invoker(dir.path(), "echo 'processing complete'", secs(10));
        assert!(matches!(
            invoker.invoke(Path::new("/dev/null")).await,
            WorkerOutcome::ParseFailure(_)
        ));
    }

    #[tokio::test]
    async fn test_error_object_becomes_domain_error() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = stub_invoker(
            dir.path(),
            r#"echo '{"error":"No relevant skills found in resume"}'"#,
            secs(10),
        );
        assert_eq!(
            invoker.invoke(Path::new("/dev/null")).await,
            WorkerOutcome::DomainError("No relevant skills found in resume".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_array_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = stub_invoker(dir.path(), "echo '[]'", secs(10));
        assert!(matches!(
            invoker.invoke(Path::new("/dev/null")).await,
            WorkerOutcome::ParseFailure(_)
        ));
    }

    #[tokio::test]
    async fn test_unstartable_binary_is_launch_failure() {
        let invoker = WorkerInvoker::new(
            "/nonexistent/interpreter",
            "/nonexistent/script.py",
            secs(10),
        );
        assert!(matches!(
            invoker.invoke(Path::new("/dev/null")).await,
            WorkerOutcome::LaunchFailure(_)
        ));
    }

    #[tokio::test]
    async fn test_hung_worker_is_killed_and_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = stub_invoker(dir.path(), "sleep 30", Duration::from_millis(100));
        assert_eq!(
            invoker.invoke(Path::new("/dev/null")).await,
            WorkerOutcome::Timeout(Duration::from_millis(100))
        );
    }
}
