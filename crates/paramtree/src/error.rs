//! Error taxonomy for tree and store operations.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by paramtree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter name or tree key cannot be expressed as a path.
    #[error("Malformed parameter path '{name}': {reason}")]
    MalformedPath { name: String, reason: String },

    /// The backend rejected a put or delete.
    #[error("Store write failed for '{name}': {message}")]
    StoreWrite { name: String, message: String },

    /// The backend rejected a listing.
    #[error("Store read failed under '{path}': {message}")]
    StoreRead { path: String, message: String },

    /// A stored value is not valid JSON. Reads recover from this locally.
    #[error("Stored value for '{name}' is not JSON: {source}")]
    Decode {
        name: String,
        source: serde_json::Error,
    },

    /// The backend could not be constructed from configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedPath {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write(name: impl Into<String>, message: impl ToString) -> Self {
        Error::StoreWrite {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn read(path: impl Into<String>, message: impl ToString) -> Self {
        Error::StoreRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for errors that mean the backend refused a request.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::StoreWrite { .. } | Error::StoreRead { .. })
    }
}

impl From<paramconf::ConfigError> for Error {
    fn from(err: paramconf::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
