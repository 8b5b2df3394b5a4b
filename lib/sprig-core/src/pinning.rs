//! Certificate pinning policy.
//!
//! A policy lists base64-encoded SHA-256 fingerprints of DER certificates.
//! The transport checks them after the regular chain validation succeeds.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use url::Url;

use crate::{Error, Result};

/// Which certificates of the presented chain a pin may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PinningMode {
    /// The end-entity certificate must match.
    #[default]
    Certificate,
    /// Any certificate of the presented chain may match.
    CertificateAuthority,
}

/// Pinned fingerprints plus the mode they apply in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinningPolicy {
    mode: PinningMode,
    fingerprints: Vec<[u8; 32]>,
}

impl PinningPolicy {
    /// Build a policy from base64 SHA-256 fingerprints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when a fingerprint is not valid
    /// base64 or does not decode to 32 bytes.
    pub fn new<I, S>(mode: PinningMode, fingerprints: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fingerprints = fingerprints
            .into_iter()
            .map(|fingerprint| {
                let fingerprint = fingerprint.as_ref();
                STANDARD
                    .decode(fingerprint)
                    .ok()
                    .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
                    .ok_or_else(|| {
                        Error::invalid_request(format!("invalid SHA-256 fingerprint: {fingerprint}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        if fingerprints.is_empty() {
            return Err(Error::invalid_request("pinning policy needs at least one fingerprint"));
        }

        Ok(Self { mode, fingerprints })
    }

    /// Pin the end-entity certificate.
    ///
    /// # Errors
    ///
    /// See [`PinningPolicy::new`].
    pub fn certificate<I, S>(fingerprints: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(PinningMode::Certificate, fingerprints)
    }

    /// Pin any certificate of the chain, typically an intermediate CA.
    ///
    /// # Errors
    ///
    /// See [`PinningPolicy::new`].
    pub fn certificate_authority<I, S>(fingerprints: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(PinningMode::CertificateAuthority, fingerprints)
    }

    /// Mode of this policy.
    #[must_use]
    pub const fn mode(&self) -> PinningMode {
        self.mode
    }

    /// Base64 SHA-256 fingerprint of a DER certificate.
    #[must_use]
    pub fn fingerprint(der: &[u8]) -> String {
        STANDARD.encode(Sha256::digest(der))
    }

    /// Whether the presented chain satisfies the policy.
    #[must_use]
    pub fn matches(&self, end_entity: &[u8], intermediates: &[&[u8]]) -> bool {
        let pinned = |der: &[u8]| {
            let digest = Sha256::digest(der);
            self.fingerprints
                .iter()
                .any(|pin| pin.as_slice() == digest.as_slice())
        };

        match self.mode {
            PinningMode::Certificate => pinned(end_entity),
            PinningMode::CertificateAuthority => {
                pinned(end_entity) || intermediates.iter().any(|der| pinned(der))
            }
        }
    }
}

/// Whether `url` falls under one of the exclusion prefixes.
#[must_use]
pub fn is_excluded(url: &Url, exclusions: &[String]) -> bool {
    exclusions
        .iter()
        .any(|prefix| url.as_str().starts_with(prefix.as_str()))
}
