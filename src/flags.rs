//! Capability and logon flag bitsets.
//!
//! Both are formatted as decimal numbers on the wire.
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Capability flags advertised at logon, describing the optional protocol
/// features this client supports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities(pub u64);

impl Capabilities {
    pub const LARGE_SESSION_ID: Capabilities = Capabilities(0x0010);
    pub const MULTI_SERVER: Capabilities = Capabilities(0x0040);
    pub const ENHANCED_ICS: Capabilities = Capabilities(0x0100);
    pub const UNICODE: Capabilities = Capabilities(0x0200);

    /// The default capability set sent by this client.
    pub const DEFAULT: Capabilities = Capabilities(
        Capabilities::UNICODE.0
            | Capabilities::LARGE_SESSION_ID.0
            | Capabilities::MULTI_SERVER.0
            | Capabilities::ENHANCED_ICS.0,
    );

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Capabilities) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flags for the logon operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogonFlags(pub u64);

impl LogonFlags {
    /// Ask the server not to register the created session for refresh
    /// bookkeeping.
    pub const NO_REGISTER_SESSION: LogonFlags = LogonFlags(0x0002);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LogonFlags {
    type Output = LogonFlags;

    fn bitor(self, rhs: LogonFlags) -> LogonFlags {
        LogonFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for LogonFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_capability_set() {
        assert_eq!(Capabilities::DEFAULT.0, 0x0350);
        assert!(Capabilities::DEFAULT.contains(Capabilities::UNICODE));
        assert!(!Capabilities::default().contains(Capabilities::UNICODE));
    }

    #[test]
    fn wire_format_is_decimal() {
        assert_eq!(Capabilities::DEFAULT.to_string(), "848");
        assert_eq!(LogonFlags::NO_REGISTER_SESSION.to_string(), "2");
        assert_eq!(LogonFlags::default().to_string(), "0");
    }

    #[test]
    fn bitor_combines() {
        let caps = Capabilities::UNICODE | Capabilities::MULTI_SERVER;
        assert!(caps.contains(Capabilities::MULTI_SERVER));
        assert!(!caps.contains(Capabilities::ENHANCED_ICS));
        assert!(!LogonFlags::NO_REGISTER_SESSION.is_empty());
    }
}
