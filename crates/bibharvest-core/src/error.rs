//! Error type for HTTP requests against the archive

/// Error from a single logical GET (all retry attempts included).
///
/// Only rate limiting is recovered inside the client; every variant that
/// reaches the caller is fatal for the run.
#[derive(Debug)]
pub enum HttpError {
    /// Non-success status other than 429
    Status { status: u16, url: String },
    /// Still 429 after the retry policy ran out of attempts
    RateLimited { attempts: u32, url: String },
    /// Connection, TLS or body read failure (no status available)
    Transport { message: String },
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, url } => write!(f, "HTTP {status}: {url}"),
            Self::RateLimited { attempts, url } => {
                write!(f, "HTTP 429 after {attempts} attempts: {url}")
            }
            Self::Transport { message } => write!(f, "HTTP error: {message}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create transport error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Transport {
            message: e.to_string(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Transport { .. } => None,
        }
    }
}
