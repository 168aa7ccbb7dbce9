//! Helper functions for loading TLS client certificates.
use std::fmt;
use std::fs;
use std::io::BufReader;
use std::path::Path;

use rustls_pemfile::{certs, pkcs8_private_keys, rsa_private_keys};

use crate::error::Error;

/// A client certificate chain with its private key, ready to be attached to
/// an HTTPS transport via
/// [`Client::set_client_auth`](crate::Client::set_client_auth).
#[derive(Clone)]
pub struct ClientAuth {
    identity: reqwest::Identity,
}

impl ClientAuth {
    pub(crate) fn identity(&self) -> &reqwest::Identity {
        &self.identity
    }
}

impl fmt::Debug for ClientAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientAuth").finish_non_exhaustive()
    }
}

/// Read a PEM encoded certificate/key pair from the given paths and build
/// the client identity for mutual TLS. Exactly one certificate chain is
/// carried.
pub fn load_client_auth(cert_path: &Path, key_path: &Path) -> Result<ClientAuth, Error> {
    let cert_pem = fs::read(cert_path)
        .map_err(|err| Error::IoPathError(cert_path.to_path_buf(), "opening cert", err))?;
    let key_pem = fs::read(key_path)
        .map_err(|err| Error::IoPathError(key_path.to_path_buf(), "opening key", err))?;

    // Parse both files upfront so malformed input fails with a descriptive
    // error instead of a generic identity failure.
    let cert_count = certs(&mut BufReader::new(cert_pem.as_slice()))
        .collect::<Result<Vec<_>, std::io::Error>>()
        .map_err(|_| Error::CertificateFailure("Failed to parse client certificate.".into()))?
        .len();
    if cert_count == 0 {
        return Err(Error::CertificateFailure(format!(
            "No certificate found in {cert_path:?}"
        )));
    }
    validate_key(&key_pem, key_path)?;

    // The identity is built from a single PEM bundle holding the chain and
    // the key.
    let mut bundle = cert_pem;
    bundle.push(b'\n');
    bundle.extend_from_slice(&key_pem);
    let identity = reqwest::Identity::from_pem(&bundle).map_err(|err| {
        Error::CertificateFailure(format!("Failed to build client identity: {err}"))
    })?;

    Ok(ClientAuth { identity })
}

/// Check that the keyfile holds at least one readable key.
/// Try the pkcs8 format first, the plain RSA format afterwards.
fn validate_key(key_pem: &[u8], path: &Path) -> Result<(), Error> {
    let keys = pkcs8_private_keys(&mut BufReader::new(key_pem))
        .collect::<Result<Vec<_>, std::io::Error>>();
    if let Ok(keys) = keys {
        if !keys.is_empty() {
            return Ok(());
        }
    }

    let keys = rsa_private_keys(&mut BufReader::new(key_pem))
        .collect::<Result<Vec<_>, std::io::Error>>()
        .map_err(|_| Error::CertificateFailure("Failed to parse client key.".into()))?;
    if keys.is_empty() {
        return Err(Error::CertificateFailure(format!(
            "Couldn't extract private key from keyfile {path:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write temp file");
        file
    }

    #[test]
    fn loads_a_generated_pair() {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("Failed to generate certificate");
        let cert = write_temp(&generated.cert.pem());
        let key = write_temp(&generated.key_pair.serialize_pem());

        let auth = load_client_auth(cert.path(), key.path());
        assert!(auth.is_ok(), "expected loaded identity: {auth:?}");
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let result = load_client_auth(Path::new("/nonexistent/cert"), Path::new("/nonexistent/key"));
        assert!(matches!(result, Err(Error::IoPathError(_, "opening cert", _))));
    }

    #[test]
    fn garbage_certificate_fails() {
        let cert = write_temp("definitely not PEM");
        let key = write_temp("neither is this");
        let result = load_client_auth(cert.path(), key.path());
        assert!(matches!(result, Err(Error::CertificateFailure(_))));
    }

    #[test]
    fn garbage_key_fails() {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("Failed to generate certificate");
        let cert = write_temp(&generated.cert.pem());
        let key = write_temp("-----BEGIN NOT A KEY-----\nZm9v\n-----END NOT A KEY-----\n");
        let result = load_client_auth(cert.path(), key.path());
        assert!(matches!(result, Err(Error::CertificateFailure(_))));
    }
}
