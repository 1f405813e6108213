use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every knob has a working default; nothing lives in module-scoped
/// globals, the whole pipeline receives this struct at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Ephemeral storage root for uploaded resumes.
    pub upload_dir: PathBuf,
    /// Directory holding the reference data files the worker reads.
    pub data_dir: PathBuf,
    /// Interpreter used to launch the scoring worker.
    pub worker_bin: String,
    /// Script passed to the interpreter; the stored upload path is appended
    /// as the single positional argument.
    pub worker_script: PathBuf,
    /// Bound on a single worker invocation. The worker gives no liveness
    /// signal, so a hung process would otherwise hang the request forever.
    pub worker_timeout: Duration,
    pub max_upload_bytes: usize,
    /// The single accepted multipart content type.
    pub allowed_content_type: String,
    /// Exact origins allowed by CORS. Empty list means permissive (dev).
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", "5000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            worker_bin: env_or("WORKER_BIN", "python"),
            worker_script: PathBuf::from(env_or("WORKER_SCRIPT", "scripts/process_resume.py")),
            worker_timeout: Duration::from_secs(
                env_or("WORKER_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("WORKER_TIMEOUT_SECS must be a number of seconds")?,
            ),
            // 5 MiB
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", "5242880")
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            allowed_content_type: "application/pdf".to_string(),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
