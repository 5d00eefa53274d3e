//! Authenticated-encryption primitives.
//!
//! Both [`KeyStore`] and [`AuthToken`] produce and consume the same wire
//! envelope, [`Box`]: a 24-byte nonce followed by ciphertext with a 16-byte
//! Poly1305/XSalsa20 MAC appended, matching NaCl/libsodium's box and
//! secretbox constructions byte-for-byte.

mod auth_token;
mod boxed;
mod keystore;

pub use auth_token::AuthToken;
pub use boxed::{Box, MAC_LENGTH};
pub use keystore::{KeyStore, PublicKey, PUBLIC_KEY_LENGTH};
