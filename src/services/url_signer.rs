//! HMAC-SHA256 signatures for time-limited object URLs.
//!
//! A signed URL has the shape
//! `{public_url}/objects/{key}?expires={unix_secs}&signature={hex}` where the
//! signature covers `key` and `expires`. Anyone holding the URL can read the
//! object until `expires`; after that the URL stops resolving and the caller
//! has to ask for a fresh one.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Characters left untouched inside a key segment.
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signing key rejected")]
    InvalidKey,
    #[error("expiry out of range")]
    InvalidExpiry,
    #[error("signed url expired")]
    Expired,
    #[error("signature malformed")]
    Malformed,
    #[error("signature mismatch")]
    Mismatch,
}

/// A bearer URL granting read access to one object until `expires_at`.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    public_url: String,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>, public_url: impl Into<String>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Sign `key` for `ttl` starting now.
    pub fn sign(&self, key: &str, ttl: Duration) -> Result<SignedUrl, SignatureError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| SignatureError::InvalidExpiry)?;
        self.sign_until(key, Utc::now() + ttl)
    }

    /// Sign `key` with an explicit expiry. Sub-second precision is dropped.
    pub fn sign_until(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<SignedUrl, SignatureError> {
        let expires = expires_at.timestamp();
        let signature = hex::encode(self.mac(key, expires)?.finalize().into_bytes());
        let url = format!(
            "{}/objects/{}?expires={}&signature={}",
            self.public_url,
            encode_key(key),
            expires,
            signature
        );
        let expires_at = Utc
            .timestamp_opt(expires, 0)
            .single()
            .ok_or(SignatureError::InvalidExpiry)?;
        Ok(SignedUrl { url, expires_at })
    }

    /// Check a presented signature against `key` and `expires` at the current time.
    pub fn verify(&self, key: &str, expires: i64, signature: &str) -> Result<(), SignatureError> {
        self.verify_at(key, expires, signature, Utc::now())
    }

    pub fn verify_at(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        if now.timestamp() > expires {
            return Err(SignatureError::Expired);
        }
        let presented = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;
        self.mac(key, expires)?
            .verify_slice(&presented)
            .map_err(|_| SignatureError::Mismatch)
    }

    fn mac(&self, key: &str, expires: i64) -> Result<HmacSha256, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| SignatureError::InvalidKey)?;
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

/// Percent-encode each `/`-separated segment of an object key.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UrlSigner {
        UrlSigner::new("test-secret", "http://localhost:3000/")
    }

    fn signature_of(url: &str) -> &str {
        url.rsplit_once("signature=").map(|(_, s)| s).unwrap()
    }

    #[test]
    fn signed_url_round_trips_through_verify() {
        let expires_at = Utc::now() + chrono::Duration::seconds(60);
        let signed = signer().sign_until("u1/17_report.pdf", expires_at).unwrap();

        assert!(
            signed
                .url
                .starts_with("http://localhost:3000/objects/u1/17_report.pdf?expires=")
        );
        assert_eq!(signed.expires_at.timestamp(), expires_at.timestamp());
        signer()
            .verify(
                "u1/17_report.pdf",
                expires_at.timestamp(),
                signature_of(&signed.url),
            )
            .unwrap();
    }

    #[test]
    fn key_segments_are_percent_encoded() {
        let signed = signer()
            .sign("u1/17_quarterly report #2.pdf", Duration::from_secs(60))
            .unwrap();
        assert!(signed.url.contains("/objects/u1/17_quarterly%20report%20%232.pdf?"));
    }

    #[test]
    fn rejects_expired_and_tampered_urls() {
        let now = Utc::now();
        let expires = now.timestamp() + 60;
        let signed = signer()
            .sign_until("u1/a.png", Utc.timestamp_opt(expires, 0).unwrap())
            .unwrap();
        let sig = signature_of(&signed.url);

        let later = now + chrono::Duration::seconds(61);
        assert_eq!(
            signer().verify_at("u1/a.png", expires, sig, later),
            Err(SignatureError::Expired)
        );
        assert_eq!(
            signer().verify_at("u2/a.png", expires, sig, now),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            signer().verify_at("u1/a.png", expires + 1, sig, now),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            signer().verify_at("u1/a.png", expires, "zz", now),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            UrlSigner::new("other", "http://x").verify_at("u1/a.png", expires, sig, now),
            Err(SignatureError::Mismatch)
        );
    }
}
