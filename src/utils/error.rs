use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to run discovery command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Discovery command exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Discovery command timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Discovery command wrote to stderr: {stderr}")]
    DiagnosticOutput { stderr: String },

    #[error("Discovery output is not valid UTF-8: {0}")]
    OutputRead(#[from] std::string::FromUtf8Error),

    #[error("Discovery output is not a valid ingress list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Coarse classification used for logging and for picking the response text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Process,
    Diagnostic,
    Read,
    Parse,
    Config,
    Io,
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Spawn { .. } | Self::NonZeroExit { .. } | Self::Timeout { .. } => {
                ErrorKind::Process
            }
            Self::DiagnosticOutput { .. } => ErrorKind::Diagnostic,
            Self::OutputRead(_) => ErrorKind::Read,
            Self::Parse(_) => ErrorKind::Parse,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorKind::Config,
            Self::IoError(_) => ErrorKind::Io,
        }
    }

    /// Short text safe to hand to a browser. Never includes stderr, paths or exit codes.
    pub fn user_friendly_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Process | ErrorKind::Diagnostic => "Error retrieving services",
            ErrorKind::Read => "Error reading services",
            ErrorKind::Parse => "Error parsing services",
            ErrorKind::Config | ErrorKind::Io => "Internal server error",
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
