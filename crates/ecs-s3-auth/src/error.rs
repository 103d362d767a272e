//! Error types for request signing.
//!
//! All signing failures are represented by [`AuthError`]. Every variant is raised
//! before any network activity takes place.

use crate::credentials::AuthMethod;

/// Errors that can occur while signing a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The configured authentication method is recognized but not implemented.
    #[error("unsupported authentication method: {0} (only v2 is implemented)")]
    UnsupportedAuthMethod(AuthMethod),

    /// The authentication method string is neither `v2` nor `v4`.
    #[error("unknown authentication method: {0}")]
    UnknownAuthMethod(String),

    /// The composed request URL could not be parsed.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// A header value contains characters that cannot be sent on the wire.
    #[error("invalid value for header {name}: {reason}")]
    InvalidHeaderValue {
        /// Header name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}
