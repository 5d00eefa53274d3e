
use crate::error::{Error, Result};
use crate::nonce::NONCE_LENGTH;

pub const MAC_LENGTH: usize = 16;

/// The wire envelope produced by [`KeyStore`](super::KeyStore) and
/// [`AuthToken`](super::AuthToken): `nonce(24) ‖ ciphertext(>=16)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Box {
    pub nonce: [u8; NONCE_LENGTH],
    pub ciphertext: Vec<u8>,
}

impl Box {
    pub fn new(nonce: [u8; NONCE_LENGTH], ciphertext: Vec<u8>) -> Self {
        Box { nonce, ciphertext }
    }

    /// Parse `nonce(24) ‖ ciphertext(>=16)` off the wire. Requires
    /// `frame.len() > 24` (a MAC-less, zero-length-plaintext ciphertext is
    /// still 16 bytes).
    pub fn from_bytes(frame: &[u8]) -> Result<Self> {
        if frame.len() <= NONCE_LENGTH {
            return Err(Error::BadMessageLength(format!(
                "frame of {} bytes is not longer than the {}-byte nonce",
                frame.len(),
                NONCE_LENGTH
            )));
        }
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(&frame[..NONCE_LENGTH]);
        Ok(Box {
            nonce,
            ciphertext: frame[NONCE_LENGTH..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LENGTH + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }
}
