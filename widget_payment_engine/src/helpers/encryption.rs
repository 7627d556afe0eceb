use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::URL_SAFE, Engine};
use cfb_mode::{
    cipher::{AsyncStreamCipher, KeyIvInit},
    Decryptor,
    Encryptor,
};
use rand::RngCore;
use wpg_common::Secret;

use crate::helpers::CryptoError;

/// AES block size, which is also the length of the initialization vector prefixed to every ciphertext.
pub const IV_SIZE: usize = 16;

/// Symmetric encryption of short strings for embedding in URLs.
///
/// AES in CFB mode, with AES-128, AES-192 or AES-256 selected by the key length. Every call to [`Encryption::encrypt`]
/// draws a fresh random IV, so encrypting the same string twice gives different tokens. Tokens are
/// `base64url(iv || ciphertext)`.
///
/// CFB carries no authentication tag. Tokens that must not be forged have to be signed as well (see
/// [`crate::helpers::UrlSigner`]).
#[derive(Clone)]
pub struct Encryption {
    key: Secret<Vec<u8>>,
}

impl std::fmt::Debug for Encryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Encryption(AES-{})", self.key.reveal().len() * 8)
    }
}

impl Encryption {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        match key.len() {
            16 | 24 | 32 => Ok(Self { key: Secret::new(key.to_vec()) }),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }

    pub fn encrypt(&self, text: &str) -> Result<String, CryptoError> {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);
        let mut buf = text.as_bytes().to_vec();
        encrypt_in_place(self.key.reveal(), &iv, &mut buf)?;
        let mut token = Vec::with_capacity(IV_SIZE + buf.len());
        token.extend_from_slice(&iv);
        token.extend_from_slice(&buf);
        Ok(URL_SAFE.encode(token))
    }

    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        let data = URL_SAFE.decode(token).map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?;
        if data.len() < IV_SIZE {
            return Err(CryptoError::CiphertextTooShort(data.len()));
        }
        let (iv, ciphertext) = data.split_at(IV_SIZE);
        let mut buf = ciphertext.to_vec();
        decrypt_in_place(self.key.reveal(), iv, &mut buf)?;
        String::from_utf8(buf).map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))
    }
}

fn encrypt_in_place(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), CryptoError> {
    let result = match key.len() {
        16 => Encryptor::<Aes128>::new_from_slices(key, iv).map(|c| c.encrypt(buf)),
        24 => Encryptor::<Aes192>::new_from_slices(key, iv).map(|c| c.encrypt(buf)),
        32 => Encryptor::<Aes256>::new_from_slices(key, iv).map(|c| c.encrypt(buf)),
        n => return Err(CryptoError::InvalidKeyLength(n)),
    };
    result.map_err(|_| CryptoError::InvalidKeyLength(key.len()))
}

fn decrypt_in_place(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), CryptoError> {
    let result = match key.len() {
        16 => Decryptor::<Aes128>::new_from_slices(key, iv).map(|c| c.decrypt(buf)),
        24 => Decryptor::<Aes192>::new_from_slices(key, iv).map(|c| c.decrypt(buf)),
        32 => Decryptor::<Aes256>::new_from_slices(key, iv).map(|c| c.decrypt(buf)),
        n => return Err(CryptoError::InvalidKeyLength(n)),
    };
    result.map_err(|_| CryptoError::InvalidKeyLength(key.len()))
}
