//! Error types for noise calibration and report privatisation.

/// Errors raised by privacy parameter validation and report handling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DpError {
    /// A privacy parameter lies outside the domain of the mechanism.
    #[error("invalid parameter: {msg}")]
    InvalidParameter {
        /// Human-readable error description.
        msg: String,
    },

    /// Numerical computation error.
    #[error("numerical error: {msg}")]
    Numerical {
        /// Human-readable error description.
        msg: String,
    },

    /// Report or mechanism configuration could not be assembled.
    #[error("configuration error: {msg}")]
    Config {
        /// Human-readable error description.
        msg: String,
    },

    /// Unsupported mechanism or option.
    #[error("unsupported: {msg}")]
    Unsupported {
        /// Human-readable error description.
        msg: String,
    },
}

/// Result type for DP operations.
pub type Result<T> = std::result::Result<T, DpError>;

impl DpError {
    /// Create an invalid parameter error.
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter { msg: msg.into() }
    }

    /// Create a numerical error.
    pub fn numerical<S: Into<String>>(msg: S) -> Self {
        Self::Numerical { msg: msg.into() }
    }

    /// Create a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config { msg: msg.into() }
    }

    /// Create an unsupported feature error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Self::Unsupported { msg: msg.into() }
    }

    /// Whether this error reports an out-of-domain privacy parameter.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}
