//! Client errors.
use std::path::PathBuf;

use crate::errcode::ErrorCode;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid server URI: {0}")]
    InvalidUri(String),

    #[error("Unsupported URI scheme '{0}' for SOAP transport")]
    UnsupportedScheme(String),

    #[error("{0}")]
    Connection(String),

    #[error("HTTP request failed:\n{0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP response status: {0}")]
    UnexpectedStatus(u16),

    #[error("Request timed out while {0}")]
    Timeout(String),

    #[error("I/O error while {0}:\n{1}")]
    IoError(String, std::io::Error),

    #[error("I/O error at path {0:?} while {1}:\n{2}")]
    IoPathError(PathBuf, &'static str, std::io::Error),

    /// The response XML ended without a `Body` element.
    #[error("Failed to locate the body element in the SOAP response")]
    BodyNotFound,

    #[error("Couldn't decode SOAP response:\n{0}")]
    ResponseDecode(String),

    /// A well-formed response carrying a non-success protocol error code.
    #[error("Server returned {0}")]
    ServerError(ErrorCode),

    /// Logon was rejected by the server. Distinct from [`Error::ServerError`]
    /// so consumers can prompt for new credentials instead of treating this
    /// as a transport problem.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(ErrorCode),

    #[error("Logon response invalid: {0}")]
    InvalidLogonResponse(&'static str),

    /// Any errors regarding the certificate setup.
    #[error("Invalid or malformed certificate: {0}")]
    CertificateFailure(String),

    /// Invalid combination of call arguments or configuration.
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    #[error("Malformed entry ID: {0}")]
    MalformedEntryId(String),

    #[error("Unsupported entry ID version {0}")]
    UnsupportedEntryIdVersion(u32),
}

impl Error {
    /// Whether this error carries the given protocol error code.
    pub fn is_code(&self, code: ErrorCode) -> bool {
        match self {
            Error::ServerError(err) | Error::AuthenticationFailed(err) => *err == code,
            _ => false,
        }
    }
}
