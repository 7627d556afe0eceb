use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::helpers::{CryptoError, Encryption, UrlSigner};

const RECEIPT_PARAM: &str = "receipt";

/// Carries a post-payment receipt through the redirect to the receipt page without any server-side session.
///
/// The receipt is serialized to JSON, encrypted, placed in the `receipt` query parameter of `base_url` and the whole
/// link is signed. Opening the link checks the signature and then its age, so a receipt link stops working after a
/// few minutes.
#[derive(Debug, Clone)]
pub struct ReceiptSealer {
    base_url: String,
    signer: UrlSigner,
    encryption: Encryption,
}

impl ReceiptSealer {
    pub fn new(base_url: &str, signer: UrlSigner, encryption: Encryption) -> Self {
        Self { base_url: base_url.to_string(), signer, encryption }
    }

    pub fn seal<T: Serialize>(&self, receipt: &T) -> Result<String, CryptoError> {
        let json = serde_json::to_string(receipt).map_err(|e| CryptoError::SerializationError(e.to_string()))?;
        let sealed = self.encryption.encrypt(&json)?;
        let url = Url::parse_with_params(&self.base_url, &[(RECEIPT_PARAM, sealed)])
            .map_err(|e| CryptoError::MalformedLink(e.to_string()))?;
        Ok(self.signer.sign(url.as_str()))
    }

    pub fn open<T: DeserializeOwned>(&self, link: &str, max_age_minutes: i64) -> Result<T, CryptoError> {
        let signed = self.signer.verify_fresh(link, max_age_minutes)?;
        let url = Url::parse(&signed.payload).map_err(|e| CryptoError::MalformedLink(e.to_string()))?;
        let sealed = url
            .query_pairs()
            .find(|(k, _)| k == RECEIPT_PARAM)
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| CryptoError::MalformedLink("no receipt parameter".into()))?;
        let json = self.encryption.decrypt(&sealed)?;
        serde_json::from_str(&json).map_err(|e| CryptoError::SerializationError(e.to_string()))
    }
}
