use thiserror::Error;

pub type Result<T> = std::result::Result<T, NoteCryptError>;

#[derive(Debug, Error)]
pub enum NoteCryptError {
    #[error("stored key record is malformed: {0}")]
    KeyDecode(String),

    #[error("encryption key is not ready")]
    KeyNotReady,

    #[error("malformed envelope: {0}")]
    EnvelopeDecode(String),

    #[error("authentication failed: wrong key or tampered data")]
    Authentication,

    #[error("encryption unavailable: {0}")]
    Unavailable(String),

    #[error("session storage error")]
    Storage(#[from] std::io::Error),

    #[error("invalid note: {0}")]
    InvalidNote(&'static str),

    #[error("internal error")]
    Internal,
}
