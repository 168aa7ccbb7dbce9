//! Single-sign-on mechanisms supported by the SSO logon operation.
use std::fmt;

/// The SSO mechanism used with [`Client::sso_logon`](crate::Client::sso_logon).
///
/// The mechanism's type tag is prefixed to the opaque credential payload
/// before it is base64 encoded into the request. Kerberos tickets carry no
/// tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SsoType {
    Ntlm,
    Kcoidc,
    Krb5,
}

impl SsoType {
    /// The wire type tag of this mechanism.
    pub fn tag(self) -> &'static str {
        match self {
            SsoType::Ntlm => "NTLM",
            SsoType::Kcoidc => "KCOIDC",
            SsoType::Krb5 => "",
        }
    }

    /// The credential payload as sent on the wire, tag prefix included.
    pub(crate) fn tagged_input(self, input: &[u8]) -> Vec<u8> {
        let tag = self.tag().as_bytes();
        let mut payload = Vec::with_capacity(tag.len() + input.len());
        payload.extend_from_slice(tag);
        payload.extend_from_slice(input);
        payload
    }
}

impl fmt::Display for SsoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn tags() {
        assert_eq!(SsoType::Ntlm.tag(), "NTLM");
        assert_eq!(SsoType::Kcoidc.tag(), "KCOIDC");
        assert_eq!(SsoType::Krb5.tag(), "");
    }

    #[test]
    fn tagged_input_prefixes_the_mechanism() {
        assert_eq!(SsoType::Kcoidc.tagged_input(b"token"), b"KCOIDCtoken");
        assert_eq!(SsoType::Krb5.tagged_input(b"ticket"), b"ticket");
    }
}
