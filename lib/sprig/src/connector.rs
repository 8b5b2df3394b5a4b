//! HTTPS connectors using rustls.

use std::sync::Arc;
use std::time::Duration;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::RootCertStore;
use rustls::crypto::CryptoProvider;

use crate::pinning::PinnedCertVerifier;
use crate::{Error, PinningPolicy, Result};

/// The process-wide provider when one is installed, ring otherwise.
fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()))
}

/// Mozilla roots shipped by `webpki-roots`.
fn root_store() -> RootCertStore {
    webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect()
}

fn http_connector(connect_timeout: Duration) -> HttpConnector {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));
    http
}

fn wrap(tls_config: rustls::ClientConfig, connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http_connector(connect_timeout))
}

/// Connector for regular requests: HTTP/1.1 and HTTP/2, plain HTTP allowed,
/// TLS validated against the Mozilla roots.
#[must_use]
pub(crate) fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store())
        .with_no_client_auth();

    wrap(tls_config, connect_timeout)
}

/// Connector for pinned requests: the chain is validated as usual, then
/// checked against `policy`.
pub(crate) fn pinned_connector(
    policy: &PinningPolicy,
    connect_timeout: Duration,
) -> Result<HttpsConnector<HttpConnector>> {
    let provider = crypto_provider();
    let verifier = PinnedCertVerifier::new(policy.clone(), Arc::new(root_store()), Arc::clone(&provider))?;

    let tls_config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();

    Ok(wrap(tls_config, connect_timeout))
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn creates_connectors() {
        let _connector = https_connector(Duration::from_secs(1));

        let_assert!(Ok(policy) = PinningPolicy::certificate(["47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="]));
        check!(pinned_connector(&policy, Duration::from_secs(1)).is_ok());
    }
}
