use thiserror::Error;

/// Network failure classification for remote API calls.
/// Every fallible remote operation returns `Result<T, NetworkError>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Request timed out")]
    RequestTimeout,

    #[error("Too many requests — rate limited by the provider")]
    TooManyRequests,

    #[error("No internet connection")]
    NoInternet,

    #[error("Server error")]
    ServerError,

    #[error("Malformed response body")]
    Serialization,

    #[error("Unknown network error")]
    Unknown,
}

/// Local storage failure classification for the history database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Disk is full")]
    DiskFull,

    #[error("Unknown storage error")]
    Unknown,
}

impl NetworkError {
    /// Classify a non-2xx HTTP status code.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            408 => NetworkError::RequestTimeout,
            429 => NetworkError::TooManyRequests,
            500..=599 => NetworkError::ServerError,
            _ => NetworkError::Unknown,
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            // Host unresolvable or connection refused
            NetworkError::NoInternet
        } else if e.is_timeout() {
            NetworkError::RequestTimeout
        } else if e.is_decode() {
            NetworkError::Serialization
        } else if let Some(status) = e.status() {
            NetworkError::from_status(status)
        } else if e.is_request() || e.is_body() {
            // Transport-level I/O failure mid-request
            NetworkError::RequestTimeout
        } else {
            NetworkError::Unknown
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            // SQLite primary result code 13 = SQLITE_FULL
            let full =
                db.code().as_deref() == Some("13") || db.message().contains("disk is full");
            if full {
                return StorageError::DiskFull;
            }
        }
        StorageError::Unknown
    }
}
