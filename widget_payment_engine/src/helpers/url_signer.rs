use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::helpers::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Marks the start of the signature parameter in a signed link.
pub const HASH_MARKER: &str = "hash=";

/// The result of a successful signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink {
    /// The link exactly as it was before signing.
    pub payload: String,
    pub issued_at: DateTime<Utc>,
}

/// Signs URLs so that the server can later prove it issued them, unaltered.
///
/// A signed link is the original URL followed by `?hash=` (or `&hash=` if the URL already has a query string), then
/// `<timestamp>.<signature>`. The timestamp is the issue time in unix seconds, and the signature is an HMAC-SHA256 over
/// every character that precedes it, so the URL and the timestamp are both covered.
///
/// Signature validity and age are separate checks. [`UrlSigner::verify`] says nothing about how old a link is, and
/// [`UrlSigner::is_expired`] says nothing about whether it was tampered with.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UrlSigner(HMAC-SHA256)")
    }
}

impl UrlSigner {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.is_empty() {
            return Err(CryptoError::InvalidKeyLength(0));
        }
        let mac = HmacSha256::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        Ok(Self { mac })
    }

    pub fn sign(&self, url: &str) -> String {
        self.sign_at(url, Utc::now())
    }

    /// Signs `url` as if it had been issued at `issued_at`.
    pub fn sign_at(&self, url: &str, issued_at: DateTime<Utc>) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        let timestamp = URL_SAFE_NO_PAD.encode(issued_at.timestamp().to_be_bytes());
        let signed_part = format!("{url}{separator}{HASH_MARKER}{timestamp}");
        let signature = URL_SAFE_NO_PAD.encode(self.signature_over(&signed_part));
        format!("{signed_part}.{signature}")
    }

    /// Checks the signature of `link`, returning the original payload and issue time if it is valid.
    pub fn verify(&self, link: &str) -> Result<SignedLink, CryptoError> {
        let parts = split_link(link)?;
        let signature = URL_SAFE_NO_PAD.decode(parts.signature).map_err(|_| CryptoError::InvalidSignature)?;
        let mut mac = self.mac.clone();
        mac.update(parts.signed_part.as_bytes());
        mac.verify_slice(&signature).map_err(|_| CryptoError::InvalidSignature)?;
        let issued_at = decode_timestamp(parts.timestamp)?;
        Ok(SignedLink { payload: parts.payload.to_string(), issued_at })
    }

    /// True if the link was issued more than `minutes` ago. The signature is not checked.
    pub fn is_expired(&self, link: &str, minutes: i64) -> Result<bool, CryptoError> {
        let parts = split_link(link)?;
        let issued_at = decode_timestamp(parts.timestamp)?;
        Ok(Utc::now() - issued_at > Duration::minutes(minutes))
    }

    /// Verifies the signature and then the age of the link. A tampered link fails with
    /// [`CryptoError::InvalidSignature`]; a genuine but stale one with [`CryptoError::LinkExpired`].
    pub fn verify_fresh(&self, link: &str, minutes: i64) -> Result<SignedLink, CryptoError> {
        let signed = self.verify(link)?;
        if self.is_expired(link, minutes)? {
            return Err(CryptoError::LinkExpired);
        }
        Ok(signed)
    }

    fn signature_over(&self, data: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

struct LinkParts<'a> {
    payload: &'a str,
    signed_part: &'a str,
    timestamp: &'a str,
    signature: &'a str,
}

fn split_link(link: &str) -> Result<LinkParts<'_>, CryptoError> {
    let marker = link.rfind(HASH_MARKER).ok_or(CryptoError::MissingSignature)?;
    if !link[..marker].ends_with(['?', '&']) {
        return Err(CryptoError::MissingSignature);
    }
    let params_start = marker + HASH_MARKER.len();
    let (timestamp, signature) = link[params_start..].split_once('.').ok_or(CryptoError::MissingSignature)?;
    let signed_part = &link[..params_start + timestamp.len()];
    Ok(LinkParts { payload: &link[..marker - 1], signed_part, timestamp, signature })
}

fn decode_timestamp(encoded: &str) -> Result<DateTime<Utc>, CryptoError> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| CryptoError::MalformedLink(e.to_string()))?;
    let bytes: [u8; 8] =
        bytes.try_into().map_err(|_| CryptoError::MalformedLink("timestamp has the wrong length".into()))?;
    Utc.timestamp_opt(i64::from_be_bytes(bytes), 0)
        .single()
        .ok_or_else(|| CryptoError::MalformedLink("timestamp is out of range".into()))
}
