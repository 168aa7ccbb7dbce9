//! Protocol error codes as returned by the server.
//!
//! The namespace is flat: the high bit marks true errors, low values are
//! reserved for success and warnings. Success is the all-zero code.
use std::fmt;

use serde::{Deserialize, Serialize};

const ERROR_BIT: u64 = 1 << 31;

/// An unsigned protocol error code from the `<er>` element of a response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u64);

#[rustfmt::skip]
impl ErrorCode {
    pub const NONE: ErrorCode                  = ErrorCode(0);
    pub const UNKNOWN: ErrorCode               = ErrorCode(ERROR_BIT | 0x01);
    pub const NOT_FOUND: ErrorCode             = ErrorCode(ERROR_BIT | 0x02);
    pub const NO_ACCESS: ErrorCode             = ErrorCode(ERROR_BIT | 0x03);
    pub const NETWORK_ERROR: ErrorCode         = ErrorCode(ERROR_BIT | 0x04);
    pub const SERVER_NOT_RESPONDING: ErrorCode = ErrorCode(ERROR_BIT | 0x05);
    pub const INVALID_TYPE: ErrorCode          = ErrorCode(ERROR_BIT | 0x06);
    pub const DATABASE_ERROR: ErrorCode        = ErrorCode(ERROR_BIT | 0x07);
    pub const COLLISION: ErrorCode             = ErrorCode(ERROR_BIT | 0x08);
    pub const LOGON_FAILED: ErrorCode          = ErrorCode(ERROR_BIT | 0x09);
    pub const HAS_MESSAGES: ErrorCode          = ErrorCode(ERROR_BIT | 0x0a);
    pub const HAS_FOLDERS: ErrorCode           = ErrorCode(ERROR_BIT | 0x0b);
    pub const HAS_RECIPIENTS: ErrorCode        = ErrorCode(ERROR_BIT | 0x0c);
    pub const HAS_ATTACHMENTS: ErrorCode       = ErrorCode(ERROR_BIT | 0x0d);
    pub const NOT_ENOUGH_MEMORY: ErrorCode     = ErrorCode(ERROR_BIT | 0x0e);
    pub const TOO_COMPLEX: ErrorCode           = ErrorCode(ERROR_BIT | 0x0f);
    pub const END_OF_SESSION: ErrorCode        = ErrorCode(ERROR_BIT | 0x10);
    pub const WARN_CALL_KEEPALIVE: ErrorCode   = ErrorCode(ERROR_BIT | 0x11);
    pub const UNABLE_TO_ABORT: ErrorCode       = ErrorCode(ERROR_BIT | 0x12);
    pub const NOT_IN_QUEUE: ErrorCode          = ErrorCode(ERROR_BIT | 0x13);
    pub const INVALID_PARAMETER: ErrorCode     = ErrorCode(ERROR_BIT | 0x14);
    pub const WARN_PARTIAL_COMPLETION: ErrorCode = ErrorCode(ERROR_BIT | 0x15);
    pub const INVALID_ENTRYID: ErrorCode       = ErrorCode(ERROR_BIT | 0x16);
    pub const BAD_VALUE: ErrorCode             = ErrorCode(ERROR_BIT | 0x17);
    pub const NO_SUPPORT: ErrorCode            = ErrorCode(ERROR_BIT | 0x18);
    pub const TOO_BIG: ErrorCode               = ErrorCode(ERROR_BIT | 0x19);
    pub const WARN_POSITION_CHANGED: ErrorCode = ErrorCode(ERROR_BIT | 0x1a);
    pub const FOLDER_CYCLE: ErrorCode          = ErrorCode(ERROR_BIT | 0x1b);
    pub const STORE_FULL: ErrorCode            = ErrorCode(ERROR_BIT | 0x1c);
    pub const PLUGIN_ERROR: ErrorCode          = ErrorCode(ERROR_BIT | 0x1d);
    pub const UNKNOWN_OBJECT: ErrorCode        = ErrorCode(ERROR_BIT | 0x1e);
    pub const NOT_IMPLEMENTED: ErrorCode       = ErrorCode(ERROR_BIT | 0x1f);
    pub const DATABASE_NOT_FOUND: ErrorCode    = ErrorCode(ERROR_BIT | 0x20);
    pub const INVALID_VERSION: ErrorCode       = ErrorCode(ERROR_BIT | 0x21);
    pub const UNKNOWN_DATABASE: ErrorCode      = ErrorCode(ERROR_BIT | 0x22);
    pub const NOT_INITIALIZED: ErrorCode       = ErrorCode(ERROR_BIT | 0x23);
    pub const CALL_FAILED: ErrorCode           = ErrorCode(ERROR_BIT | 0x24);
    pub const SSO_CONTINUE: ErrorCode          = ErrorCode(ERROR_BIT | 0x25);
    pub const TIMEOUT: ErrorCode               = ErrorCode(ERROR_BIT | 0x26);
    pub const INVALID_BOOKMARK: ErrorCode      = ErrorCode(ERROR_BIT | 0x27);
    pub const UNABLE_TO_COMPLETE: ErrorCode    = ErrorCode(ERROR_BIT | 0x28);
    pub const UNKNOWN_INSTANCE_ID: ErrorCode   = ErrorCode(ERROR_BIT | 0x29);
    pub const IGNORE_ME: ErrorCode             = ErrorCode(ERROR_BIT | 0x2a);
    pub const BUSY: ErrorCode                  = ErrorCode(ERROR_BIT | 0x2b);
    pub const OBJECT_DELETED: ErrorCode        = ErrorCode(ERROR_BIT | 0x2c);
    pub const USER_CANCEL: ErrorCode           = ErrorCode(ERROR_BIT | 0x2d);
    pub const UNKNOWN_FLAGS: ErrorCode         = ErrorCode(ERROR_BIT | 0x2e);
    pub const SUBMITTED: ErrorCode             = ErrorCode(ERROR_BIT | 0x2f);
}

impl ErrorCode {
    /// Success is the all-zero code.
    pub fn is_success(self) -> bool {
        self == ErrorCode::NONE
    }

    /// True errors carry the high bit.
    pub fn is_error(self) -> bool {
        self.0 & ERROR_BIT != 0
    }

    /// Human-readable text for the commonly surfaced codes. Returns `None`
    /// for codes without a known text.
    pub fn text(self) -> Option<&'static str> {
        let text = match self {
            ErrorCode::UNKNOWN => "Unknown",
            ErrorCode::NOT_FOUND => "Not Found",
            ErrorCode::NO_ACCESS => "No Access",
            ErrorCode::NETWORK_ERROR => "Network Error",
            ErrorCode::SERVER_NOT_RESPONDING => "Server Not Responding",
            ErrorCode::INVALID_TYPE => "Invalid Type",
            ErrorCode::DATABASE_ERROR => "Database Error",
            ErrorCode::LOGON_FAILED => "Logon Failed",
            ErrorCode::NOT_ENOUGH_MEMORY => "Not Enough Memory",
            ErrorCode::END_OF_SESSION => "End Of Session",
            ErrorCode::TIMEOUT => "Timeout",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{text} (0x{:08x})", self.0),
            None => write!(f, "error 0x{:08x}", self.0),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn code_values_match_the_wire_namespace() {
        assert_eq!(ErrorCode::NONE.0, 0);
        assert_eq!(ErrorCode::UNKNOWN.0, 0x8000_0001);
        assert_eq!(ErrorCode::LOGON_FAILED.0, 0x8000_0009);
        assert_eq!(ErrorCode::END_OF_SESSION.0, 0x8000_0010);
        assert_eq!(ErrorCode::SUBMITTED.0, 0x8000_002f);
    }

    #[test]
    fn classification() {
        assert!(ErrorCode::NONE.is_success());
        assert!(!ErrorCode::NONE.is_error());
        assert!(ErrorCode::LOGON_FAILED.is_error());
        assert!(!ErrorCode::LOGON_FAILED.is_success());
    }

    #[test]
    fn display_includes_text_when_known() {
        assert_eq!(
            ErrorCode::END_OF_SESSION.to_string(),
            "End Of Session (0x80000010)"
        );
        assert_eq!(ErrorCode(0x8000_002b).to_string(), "error 0x8000002b");
    }
}
