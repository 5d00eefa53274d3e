
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::XSalsa20Poly1305;
use zeroize::Zeroizing;

use crate::crypto::boxed::Box;
use crate::error::{Error, Result};
use crate::nonce::Nonce;

pub const AUTH_TOKEN_LENGTH: usize = 32;

/// A 32-byte symmetric secret shared out-of-band, used to authenticate the
/// responder's first message to the initiator. Consumed exactly once:
/// callers are expected to drop an `AuthToken` after its single legitimate
/// use (the `token` message), though this type does not itself enforce
/// single use — that discipline lives in the signaling state machine.
pub struct AuthToken {
    secret: Zeroizing<[u8; AUTH_TOKEN_LENGTH]>,
}

impl AuthToken {
    /// Generate a fresh token, to be conveyed to the responder through a
    /// side channel not specified here (e.g. embedded in a QR code or URL
    /// fragment).
    pub fn new() -> Self {
        let mut secret = [0u8; AUTH_TOKEN_LENGTH];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut secret);
        AuthToken {
            secret: Zeroizing::new(secret),
        }
    }

    pub fn from_bytes(secret: [u8; AUTH_TOKEN_LENGTH]) -> Self {
        AuthToken {
            secret: Zeroizing::new(secret),
        }
    }

    pub fn as_bytes(&self) -> &[u8; AUTH_TOKEN_LENGTH] {
        &self.secret
    }

    fn cipher(&self) -> XSalsa20Poly1305 {
        XSalsa20Poly1305::new_from_slice(self.secret.as_ref())
            .expect("auth token secret is exactly the cipher's key length")
    }

    pub fn encrypt(&self, plaintext: &[u8], nonce: Nonce) -> Box {
        let wire_nonce = nonce.to_bytes();
        let box_nonce = xsalsa20poly1305::Nonce::from_slice(&wire_nonce);
        let ciphertext = self
            .cipher()
            .encrypt(box_nonce, plaintext)
            .expect("xsalsa20poly1305 encryption is infallible for well-formed input");
        Box::new(wire_nonce, ciphertext)
    }

    pub fn decrypt(&self, b: &Box) -> Result<Vec<u8>> {
        let box_nonce = xsalsa20poly1305::Nonce::from_slice(&b.nonce);
        self.cipher()
            .decrypt(box_nonce, b.ciphertext.as_slice())
            .map_err(|_| Error::DecryptionFailed)
    }
}

impl Default for AuthToken {
    fn default() -> Self {
        AuthToken::new()
    }
}
