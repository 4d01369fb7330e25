//! Error types for the authkit crate

use thiserror::Error;

/// Errors that can occur while encoding a password verifier
#[derive(Error, Debug)]
pub enum Error {
    /// The requested password_encryption scheme is not recognised
    #[error("unrecognised password_encryption scheme {0:?}")]
    UnrecognizedScheme(String),

    /// md5 verifiers hash the username into the digest, so it is required
    #[error("the md5 scheme requires a username")]
    MissingUsername,
}

/// Result type for authkit operations
pub type Result<T> = std::result::Result<T, Error>;
