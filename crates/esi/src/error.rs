use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transient ESI failure: {0}")]
    Transient(String),

    #[error("ESI rejected the credential (HTTP {status})")]
    Auth { status: u16 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected HTTP {status} from {url}")]
    Rejected { status: u16, url: String },

    #[error("Malformed ESI payload: {0}")]
    Malformed(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Coarse failure class used by callers to pick a recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry at the next poll.
    Transient,
    /// Credential is no longer valid; surface to the user.
    Auth,
    /// Degrade to safe defaults.
    Malformed,
}

impl GatewayError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Transient(_) | Self::Client(_) => ErrorClass::Transient,
            Self::Auth { .. } => ErrorClass::Auth,
            Self::NotFound(_) | Self::Rejected { .. } | Self::Malformed(_) => ErrorClass::Malformed,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Maps a non-success status to its error, `None` for 2xx.
    pub(crate) fn from_status(status: reqwest::StatusCode, url: &str) -> Option<Self> {
        if status.is_success() {
            return None;
        }
        let code = status.as_u16();
        Some(match code {
            401 | 403 => Self::Auth { status: code },
            404 => Self::NotFound(url.to_string()),
            408 | 420 | 429 => Self::Transient(format!("HTTP {code} from {url}")),
            _ if status.is_server_error() => Self::Transient(format!("HTTP {code} from {url}")),
            _ => Self::Rejected {
                status: code,
                url: url.to_string(),
            },
        })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if err.is_builder() {
            Self::Client(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
