use thiserror::Error;

/// Errors raised by the review model and the document exporter.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// A comment referenced a path outside the session's change set.
    #[error("file not in change set: {0}")]
    UnknownFile(String),

    /// Document serialization failed.
    #[error("document serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Document parsing failed.
    #[error("document parse error: {0}")]
    Deserialize(#[from] toml::de::Error),

    /// The persistence layer rejected a read or write.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
