//! Cryptographic building blocks for authentication and link handling.
//!
//! * [`LoginToken`] generates bearer credentials and [`hash_token`] derives their stored form.
//! * [`hash_password`] and [`verify_password`] wrap bcrypt.
//! * [`UrlSigner`] signs and verifies links, with expiry evaluated separately from the signature.
//! * [`Encryption`] reversibly encrypts short identifiers (e-mail addresses) so they can travel inside links.
//! * [`ReceiptSealer`] combines the last two to carry a post-payment receipt through a redirect.
mod crypto_error;
mod encryption;
mod login_token;
mod password;
mod receipt;
mod url_signer;

pub use crypto_error::CryptoError;
pub use encryption::{Encryption, IV_SIZE};
pub use login_token::{hash_token, parse_bearer_header, LoginToken, BEARER_SCHEME, TOKEN_ENTROPY_BYTES, TOKEN_LENGTH};
pub use password::{hash_password, hash_password_with_cost, verify_password, PASSWORD_HASH_COST};
pub use receipt::ReceiptSealer;
pub use url_signer::{SignedLink, UrlSigner, HASH_MARKER};
