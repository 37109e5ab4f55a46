use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyserverError {
    #[error("keyserver unreachable: {0}")]
    Unreachable(String),

    #[error("keyserver request failed: {0}")]
    RequestFailed(String),

    #[error("key not found on keyserver: {0}")]
    KeyNotFound(String),

    #[error("invalid keyserver response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for KeyserverError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::Unreachable(format!("connection failed: {e}"))
        } else {
            Self::RequestFailed(e.to_string())
        }
    }
}
