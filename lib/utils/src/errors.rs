use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Broad family of a [`ScrollError`], used to decide how it surfaces to the caller.
#[derive(Clone, Copy, Debug, Display, EnumString, IntoStaticStr, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// Raised while building a controller, halts construction.
    Configuration,
    /// Raised by the call that needed an element that could not be found.
    Lookup,
    /// Reported through the rejection of a load, never thrown.
    Request,
    /// Reported by the host environment.
    Platform,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollError {
    #[error("Expected single element for \"{property}\"")]
    AmbiguousElement {
        property: String,
    },
    #[error("Element \"{selector}\" not found for \"{property}\"")]
    ElementNotFound {
        selector: String,
        property: String,
    },
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Item \"{0}\" not found")]
    ItemNotFound(String),
    #[error("Invalid selector \"{0}\"")]
    InvalidSelector(String),
    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse response: {0}")]
    ResponseParse(String),
    #[error("Platform error: {0}")]
    Platform(String),
}

impl ScrollError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrollError::AmbiguousElement { .. } | ScrollError::ElementNotFound { .. } | ScrollError::InvalidOptions(_) => ErrorKind::Configuration,
            ScrollError::ItemNotFound(_) | ScrollError::InvalidSelector(_) => ErrorKind::Lookup,
            ScrollError::InvalidHeader(_) | ScrollError::RequestFailed(_) | ScrollError::ResponseParse(_) => ErrorKind::Request,
            ScrollError::Platform(_) => ErrorKind::Platform,
        }
    }

    /// Constructs a new [`ScrollError::Platform`] from some other type.
    pub fn new(msg: impl ToString) -> Self {
        Self::Platform(msg.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for ScrollError {
    fn from(error: http::header::InvalidHeaderName) -> Self {
        ScrollError::InvalidHeader(error.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for ScrollError {
    fn from(error: http::header::InvalidHeaderValue) -> Self {
        ScrollError::InvalidHeader(error.to_string())
    }
}
