use std::time::Duration;

use crate::errors::AppError;
use crate::models::job::JobMatch;

/// Cap on how much raw worker output is kept for logging when
/// classification fails. Never sent to clients.
const RAW_EXCERPT_CHARS: usize = 500;

/// The terminal, exactly-one-of classification of a worker invocation.
/// Produced only after the process exit (or launch error, or timeout kill)
/// and the full drain of both output streams.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    /// Exit 0 with a non-empty, schema-valid JSON array on stdout.
    Success(Vec<JobMatch>),
    /// Exit 0 but the worker reported a semantic problem
    /// (stdout was `{"error": ...}`).
    DomainError(String),
    /// Non-zero exit. Only the first stderr line is carried onward.
    ProcessFailure {
        exit_code: i32,
        stderr_excerpt: String,
    },
    /// The process could not be started at all.
    LaunchFailure(String),
    /// Exit 0 but stdout is not a non-empty array of valid rows.
    ParseFailure(String),
    /// The configured bound elapsed and the process was killed.
    Timeout(Duration),
}

impl WorkerOutcome {
    /// Bridges the outcome into the HTTP error taxonomy; `Success` carries
    /// the payload through.
    pub fn into_result(self) -> Result<Vec<JobMatch>, AppError> {
        match self {
            WorkerOutcome::Success(jobs) => Ok(jobs),
            WorkerOutcome::DomainError(message) => Err(AppError::Domain(message)),
            WorkerOutcome::ProcessFailure {
                exit_code,
                stderr_excerpt,
            } => Err(AppError::WorkerExit {
                exit_code,
                stderr_excerpt,
            }),
            WorkerOutcome::LaunchFailure(reason) => Err(AppError::WorkerLaunch(reason)),
            WorkerOutcome::ParseFailure(raw) => Err(AppError::WorkerOutput(raw)),
            WorkerOutcome::Timeout(elapsed) => Err(AppError::WorkerTimeout(elapsed)),
        }
    }
}

/// Classifies a finished (launched, exited, fully drained) invocation.
/// Pure: identical inputs always classify identically.
pub fn resolve_exit(exit_code: Option<i32>, stdout: &str, stderr: &str) -> WorkerOutcome {
    // A signal-killed child has no code; treat it as a failed run.
    let code = exit_code.unwrap_or(-1);
    if code != 0 {
        return WorkerOutcome::ProcessFailure {
            exit_code: code,
            stderr_excerpt: first_line(stderr).to_string(),
        };
    }
    classify_stdout(stdout)
}

fn classify_stdout(stdout: &str) -> WorkerOutcome {
    let value: serde_json::Value = match serde_json::from_str(stdout.trim()) {
        Ok(v) => v,
        Err(_) => return WorkerOutcome::ParseFailure(excerpt(stdout)),
    };

    // An object with an `error` field is the worker's in-band failure shape.
    if let Some(message) = value.get("error") {
        let message = message
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        return WorkerOutcome::DomainError(message);
    }

    let mut jobs: Vec<JobMatch> = match serde_json::from_value(value) {
        Ok(jobs) => jobs,
        Err(_) => return WorkerOutcome::ParseFailure(excerpt(stdout)),
    };
    if jobs.is_empty() {
        return WorkerOutcome::ParseFailure(excerpt(stdout));
    }

    for job in &mut jobs {
        job.clamp_score();
    }
    WorkerOutcome::Success(jobs)
}

/// First line of the diagnostic stream; the rest never leaves the server.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(RAW_EXCERPT_CHARS).collect()
}
