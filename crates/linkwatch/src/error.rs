//! CLI error types with miette diagnostics.
//!
//! Maps config and core errors into user-facing errors with actionable
//! help text.

use miette::Diagnostic;
use thiserror::Error;

use linkwatch_config::ConfigError;
use linkwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const IO: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(linkwatch::no_config),
        help(
            "Create one with: linkwatch init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Invalid configuration")]
    #[diagnostic(
        code(linkwatch::config),
        help("Run: linkwatch check -v for details")
    )]
    Config(#[source] ConfigError),

    #[error("Refusing to overwrite {path}")]
    #[diagnostic(code(linkwatch::exists), help("Pass --force to replace it."))]
    AlreadyExists { path: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(linkwatch::core))]
    Core(#[from] CoreError),

    #[error("Background task failed: {0}")]
    #[diagnostic(code(linkwatch::task))]
    Task(#[from] tokio::task::JoinError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(linkwatch::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    #[diagnostic(code(linkwatch::json))]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => Self::NoConfig {
                path: path.display().to_string(),
            },
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. } | Self::Config(_) => exit_code::CONFIG,
            Self::AlreadyExists { .. } => exit_code::USAGE,
            Self::Io(_) | Self::Core(CoreError::Export { .. }) => exit_code::IO,
            _ => exit_code::GENERAL,
        }
    }
}
