use thiserror::Error;
use url::Url;

use crate::config::ConfigError;
use crate::fetcher::FetchError;

/// Classification reported alongside a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    HttpStatus,
    Timeout,
    UnsupportedContentType,
    Oversized,
    UnwrapExhausted,
    InvalidInput,
}

impl ErrorKind {
    /// Process exit status: 2 for HTTP status errors, 3 for timeouts, 1 for
    /// everything else.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::HttpStatus => 2,
            Self::Timeout => 3,
            _ => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("could not unwrap aggregator article {url}: no publisher link found")]
    NoPublisherLink { url: Url },

    #[error("could not unwrap aggregator article: still wrapped after {attempts} re-fetches")]
    UnwrapExhausted { attempts: u8 },

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ConfigError),
}

impl WorkerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(err) => match err {
                FetchError::Http { .. } => ErrorKind::HttpStatus,
                FetchError::ConnectTimeout | FetchError::RequestTimeout => ErrorKind::Timeout,
                FetchError::UnsupportedContentType(_) => ErrorKind::UnsupportedContentType,
                FetchError::BodyTooLarge { .. } => ErrorKind::Oversized,
                FetchError::InvalidUrl(_) => ErrorKind::InvalidInput,
                FetchError::Connect(_)
                | FetchError::RedirectLoop
                | FetchError::Io(_)
                | FetchError::Unknown(_) => ErrorKind::Transport,
            },
            Self::NoPublisherLink { .. } | Self::UnwrapExhausted { .. } => {
                ErrorKind::UnwrapExhausted
            }
            Self::InvalidRequest(_) => ErrorKind::InvalidInput,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// Message placed in the failure envelope.
    pub fn envelope_message(&self) -> String {
        match self {
            Self::Fetch(FetchError::Http { status }) => format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            ),
            Self::Fetch(err) if err.is_timeout() => "Request timeout".to_string(),
            other => other.to_string(),
        }
    }
}
