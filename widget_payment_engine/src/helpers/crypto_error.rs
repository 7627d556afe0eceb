use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid key length of {0} bytes. Keys must be 16, 24 or 32 bytes long")]
    InvalidKeyLength(usize),
    #[error("Ciphertext of {0} bytes is shorter than one cipher block")]
    CiphertextTooShort(usize),
    #[error("Ciphertext is malformed. {0}")]
    MalformedCiphertext(String),
    #[error("The link is not signed")]
    MissingSignature,
    #[error("The link signature is invalid")]
    InvalidSignature,
    #[error("The link has expired")]
    LinkExpired,
    #[error("The link is malformed. {0}")]
    MalformedLink(String),
    #[error("Password hashing failed. {0}")]
    PasswordHashError(String),
    #[error("Could not serialize sealed data. {0}")]
    SerializationError(String),
}
