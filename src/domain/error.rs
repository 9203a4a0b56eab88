//! Domain error types.
//!
//! Signal evaluation itself never fails; these cover the layers around it
//! (configuration, data loading, file I/O).

/// Top-level error type for allocsignal.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SignalError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status reported by the CLI for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            SignalError::Io(_) => 1,
            SignalError::ConfigParse { .. }
            | SignalError::ConfigMissing { .. }
            | SignalError::ConfigInvalid { .. } => 2,
            SignalError::Data { .. } => 3,
            SignalError::NoData { .. } => 5,
        }
    }
}

impl From<csv::Error> for SignalError {
    fn from(err: csv::Error) -> Self {
        SignalError::Data {
            reason: err.to_string(),
        }
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
