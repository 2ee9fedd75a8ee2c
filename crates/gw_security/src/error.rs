use core::str::Utf8Error;

use gw_marshal::MarshallError;
use thiserror::Error;

/// Errors raised while storing or restoring the current user.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The user could not be encoded or decoded.
    #[error(transparent)]
    Marshall(#[from] MarshallError),

    /// The cookie value does not decode to UTF-8.
    #[error("cookie value is not valid UTF-8")]
    Encoding(#[from] Utf8Error),

    /// The bootstrapped security context is not JSON.
    #[error("invalid security context")]
    Context(#[from] serde_json::Error),

    /// The stored payload decodes to `null`.
    #[error("no user in the stored payload")]
    NoUser,
}
