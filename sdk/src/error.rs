//! Error types for the subscription gateway SDK
//!
//! Every fallible operation in the crate returns [`Result`]. The variants map
//! onto the four failure families a caller has to tell apart:
//!
//! - **Validation** – [`Error::RecordInvalid`] (raised locally, before any
//!   remote call) and [`Error::RemoteValidation`] (reported by the gateway).
//! - **Unsupported operation** – [`Error::NotSupported`], e.g. creating an
//!   add-on through a subscription's read-only collection.
//! - **Remote lookup** – [`Error::NotFound`].
//! - **Remote failure** – [`Error::Remote`], any transport or service error.
//!
//! # Example
//!
//! ```rust
//! use subscription_gateway::{Error, MemoryGateway, Subscription};
//!
//! let gateway = MemoryGateway::default();
//! match Subscription::find(&gateway, "missing") {
//!     Ok(subscription) => println!("found {:?}", subscription.id()),
//!     Err(Error::NotFound(what)) => println!("no such record: {what}"),
//!     Err(other) => println!("gateway failure: {other}"),
//! }
//! ```

use crate::{types::RemoteValidationError, validation::Errors};
use thiserror::Error;

/// Result type for subscription gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur when using the subscription gateway SDK
#[derive(Error, Debug)]
pub enum Error {
    /// Record failed validation; carries the full error mapping
    #[error("Validation failed: {0}")]
    RecordInvalid(Errors),

    /// Validation errors reported by the remote gateway
    #[error("Remote validation failed: {}", format_remote_errors(.0))]
    RemoteValidation(Vec<RemoteValidationError>),

    /// Operation the gateway API does not offer
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Remote record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport or service failure
    #[error("Gateway error: {0}")]
    Remote(String),

    /// Record lifecycle does not allow the operation
    #[error("Invalid record state: {0}")]
    InvalidState(String),

    /// Error from serde JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is a validation failure, local or remote
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::RecordInvalid(_) | Self::RemoteValidation(_))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self::Remote(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self::Remote(msg.to_string())
    }
}

fn format_remote_errors(errors: &[RemoteValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.attribute, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}
