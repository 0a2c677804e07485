//! Probe error types.
//!
//! Only two conditions are errors: a request the caller got wrong, and a
//! tool that could not be started. Packet loss, unreachable hosts and
//! non-zero exit codes are ordinary outcomes folded into the statistics.

use thiserror::Error;

/// Errors that can occur while handling a probe request.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A query value was missing, malformed or out of range.
    #[error("{message}")]
    InvalidParameter {
        /// Name of the offending field.
        field: &'static str,
        /// Message naming the field and, for ranges, the legal bounds.
        message: String,
    },

    /// The external ping tool could not be launched.
    #[error("failed to launch '{program}': {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            message: message.into(),
        }
    }

    /// Whether the caller is at fault (maps to `400 Bad Request`).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }

    /// Offending field name for parameter errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidParameter { field, .. } => Some(*field),
            Self::ToolLaunch { .. } => None,
        }
    }
}
