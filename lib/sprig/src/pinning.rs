//! rustls verifier enforcing a [`PinningPolicy`].

use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::{Error, PinningPolicy, Result};

/// Message of the TLS error raised on a pin mismatch.
///
/// The transport looks for it in the hyper error chain to report
/// [`Error::Pinning`] instead of a connection error.
pub(crate) const PIN_MISMATCH: &str = "certificate pin mismatch";

/// Chain validation by webpki, then the pin check.
#[derive(Debug)]
pub(crate) struct PinnedCertVerifier {
    inner: Arc<WebPkiServerVerifier>,
    policy: PinningPolicy,
}

impl PinnedCertVerifier {
    pub(crate) fn new(
        policy: PinningPolicy,
        roots: Arc<RootCertStore>,
        provider: Arc<CryptoProvider>,
    ) -> Result<Self> {
        let inner = WebPkiServerVerifier::builder_with_provider(roots, provider)
            .build()
            .map_err(|e| Error::tls(e.to_string()))?;
        Ok(Self { inner, policy })
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> core::result::Result<ServerCertVerified, rustls::Error> {
        let verified = self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)?;

        let chain: Vec<&[u8]> = intermediates.iter().map(AsRef::as_ref).collect();
        if self.policy.matches(end_entity.as_ref(), &chain) {
            Ok(verified)
        } else {
            tracing::warn!(server = ?server_name, "presented certificates match no pin");
            Err(rustls::Error::General(PIN_MISMATCH.to_string()))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> core::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> core::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
