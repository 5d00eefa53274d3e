#[cfg(test)]
mod keystore_test;

use crypto_box::aead::Aead;
use crypto_box::{PublicKey as BoxPublicKey, SalsaBox, SecretKey};
use zeroize::Zeroize;

use crate::crypto::boxed::Box;
use crate::error::{Error, Result};
use crate::nonce::Nonce;

pub const PUBLIC_KEY_LENGTH: usize = 32;

/// A peer's public key, as exchanged in `client-hello`/`token`/`key`
/// messages.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        PublicKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl From<&PublicKey> for BoxPublicKey {
    fn from(pk: &PublicKey) -> Self {
        BoxPublicKey::from(pk.0)
    }
}

/// Owns a secret scalar and its derived public key. Used both for
/// *permanent* identities (created once per role, lives for the process'
/// lifetime) and for *session* keys (created once per handshake, or lazily
/// per responder by the initiator).
pub struct KeyStore {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyStore {
    /// Generate a fresh keypair.
    pub fn new() -> Self {
        let secret_key = SecretKey::generate(&mut rand_core::OsRng);
        let public_key = PublicKey::from_bytes(*secret_key.public_key().as_bytes());
        KeyStore {
            secret_key,
            public_key,
        }
    }

    /// Restore a keystore from a previously persisted secret key. Key
    /// persistence itself is out of scope for this crate; this only
    /// reconstructs the in-memory keystore from bytes the host already
    /// has.
    pub fn from_secret_bytes(secret_bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        let secret_key = SecretKey::from(secret_bytes);
        let public_key = PublicKey::from_bytes(*secret_key.public_key().as_bytes());
        KeyStore {
            secret_key,
            public_key,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Encrypt `plaintext` for `peer_public` using the nonce already chosen
    /// by the caller (the signaling framing layer picks the nonce; the
    /// keystore never generates its own).
    pub fn encrypt(&self, plaintext: &[u8], nonce: Nonce, peer_public: &PublicKey) -> Box {
        let cipher = SalsaBox::new(&BoxPublicKey::from(peer_public), &self.secret_key);
        let wire_nonce = nonce.to_bytes();
        let box_nonce = crypto_box::Nonce::from_slice(&wire_nonce);
        let ciphertext = cipher
            .encrypt(box_nonce, plaintext)
            .expect("crypto_box encryption is infallible for well-formed input");
        Box::new(wire_nonce, ciphertext)
    }

    pub fn decrypt(&self, b: &Box, peer_public: &PublicKey) -> Result<Vec<u8>> {
        let cipher = SalsaBox::new(&BoxPublicKey::from(peer_public), &self.secret_key);
        let box_nonce = crypto_box::Nonce::from_slice(&b.nonce);
        cipher
            .decrypt(box_nonce, b.ciphertext.as_slice())
            .map_err(|_| Error::DecryptionFailed)
    }
}

impl Drop for KeyStore {
    fn drop(&mut self) {
        // SecretKey already zeroizes on drop; this guards the copy of the
        // public key bytes we keep for logging, which carries no secrecy
        // but we zero it anyway for uniformity.
        self.public_key.0.zeroize();
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        KeyStore::new()
    }
}
