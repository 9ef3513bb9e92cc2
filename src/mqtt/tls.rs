//! TLS trust configuration for broker sessions.

use anyhow::{bail, Context, Result};
use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, Error as TlsError, RootCertStore, ServerName};
use rustls_pemfile::certs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Build the rustls client config for one TLS endpoint.
///
/// When a CA file is given it is loaded as the sole trust root for the
/// session. `insecure` suppresses certificate chain and hostname
/// verification entirely.
pub fn client_config(ca_file: Option<&Path>, insecure: bool) -> Result<ClientConfig> {
    let mut root_store = RootCertStore::empty();
    if let Some(ca_path) = ca_file {
        let ca_reader = &mut BufReader::new(
            File::open(ca_path)
                .with_context(|| format!("open CA cert: {}", ca_path.display()))?,
        );
        let ca_der = certs(ca_reader).context("parse CA certificates")?;
        let ca_certs: Vec<Certificate> = ca_der.into_iter().map(Certificate).collect();
        let (added, _) = root_store.add_parsable_certificates(&ca_certs);
        if added == 0 {
            bail!("no CA certificates loaded from {}", ca_path.display());
        }
    } else if !insecure {
        bail!("TLS session requires a CA certificate or --insecure");
    }

    let mut config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    if insecure {
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(SkipVerification));
    }

    Ok(config)
}

/// Verifier that accepts any broker certificate without validating the
/// chain or the hostname.
struct SkipVerification;

impl ServerCertVerifier for SkipVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_test_ca(dir: &Path) -> PathBuf {
        let key = KeyPair::generate().expect("generate CA key");
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, "test-ca");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).expect("self-sign CA");
        let path = dir.join("ca.pem");
        std::fs::write(&path, cert.pem()).expect("write ca");
        path
    }

    #[test]
    fn ca_file_becomes_the_trust_root() {
        let dir = tempdir().unwrap();
        let ca = write_test_ca(dir.path());
        assert!(client_config(Some(&ca), false).is_ok());
    }

    #[test]
    fn ca_file_without_certificates_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ca.pem");
        std::fs::write(&path, "not a pem").unwrap();
        assert!(client_config(Some(&path), false).is_err());
    }

    #[test]
    fn tls_without_trust_configuration_is_rejected() {
        assert!(client_config(None, false).is_err());
    }

    #[test]
    fn insecure_mode_needs_no_ca() {
        assert!(client_config(None, true).is_ok());
    }
}
