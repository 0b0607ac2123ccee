/// Unified error type for the index advisor
/// Provides structured error handling with categories for different failure modes
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AdvisorError {
    /// Oracle errors: EXPLAIN, selectivity or schema lookups against the database
    #[error("Oracle error: {message}")]
    Oracle {
        message: String,
        context: Option<String>,
    },

    /// Parse errors: CREATE TABLE text or version strings that cannot be understood
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        input: Option<String>,
    },

    /// Unsupported statements or constructs the advisor does not analyze
    #[error("Unsupported: {message}")]
    Unsupported {
        message: String,
    },

    /// Internal errors: should never happen, indicates bug
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        context: Option<String>,
    },
}

impl AdvisorError {
    pub fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
            context: None,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            input: None,
        }
    }

    pub fn parse_with_input(message: impl Into<String>, input: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            input: Some(input.into()),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Oracle { context: ctx, .. } => *ctx = Some(context.into()),
            Self::Internal { context: ctx, .. } => *ctx = Some(context.into()),
            Self::Parse { input, .. } => *input = Some(context.into()),
            _ => {}
        }
        self
    }
}

impl From<anyhow::Error> for AdvisorError {
    fn from(err: anyhow::Error) -> Self {
        Self::Oracle {
            message: err.to_string(),
            context: None,
        }
    }
}

/// Result type alias for advisor operations
pub type AdvisorResult<T> = Result<T, AdvisorError>;
