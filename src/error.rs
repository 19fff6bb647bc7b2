//! Error types shared by the fetcher and the source adapters.
//!
//! Every adapter failure is one of three kinds. The collector never lets any of
//! them escape a run; it records the message in `fetchStatus` and keeps the
//! fallback section instead.

/// Failure of a single source during a run.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Network, timeout or HTTP status failure after all attempts were used.
    #[error("fetch {url} failed after {attempts} attempt(s): {message}")]
    Fetch {
        url: String,
        attempts: u32,
        message: String,
    },

    /// The response could not be turned into a summary.
    #[error("{source_name}: unparseable response: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An enabled source lacks something it needs to build its request.
    #[error("{source_name}: configuration error: {message}")]
    Config {
        source_name: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, CollectError>;

impl CollectError {
    pub fn fetch(url: impl Into<String>, attempts: u32, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            attempts,
            message: message.into(),
        }
    }

    pub fn parse(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source.into(),
            message: message.into(),
        }
    }

    pub fn config(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            source_name: source.into(),
            message: message.into(),
        }
    }

    /// Short label used for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch_error",
            Self::Parse { .. } => "parse_error",
            Self::Config { .. } => "config_error",
        }
    }

    /// A later run may succeed without anyone touching the configuration.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
