//! The key-selection matrix of §4.6, lifted out of the engine's send/receive
//! paths into a small lookup type so the "which key for this frame" decision
//! is made and tested in one place instead of branching inline at every call
//! site.


use crate::crypto::{AuthToken, Box as SaltyBox, KeyStore, PublicKey};
use crate::error::Result;
use crate::nonce::Nonce;

/// A resolved key pairing for one frame, borrowed from whichever owner
/// holds the actual secret material for the engine's lifetime.
pub enum KeySelector<'a> {
    PermanentToServer {
        own: &'a KeyStore,
        server: &'a PublicKey,
    },
    AuthToken {
        token: &'a AuthToken,
    },
    PermanentToPeer {
        own: &'a KeyStore,
        peer: &'a PublicKey,
    },
    SessionToPeer {
        own: &'a KeyStore,
        peer: &'a PublicKey,
    },
}

impl<'a> KeySelector<'a> {
    pub fn encrypt(&self, plaintext: &[u8], nonce: Nonce) -> SaltyBox {
        match self {
            KeySelector::PermanentToServer { own, server } => own.encrypt(plaintext, nonce, server),
            KeySelector::AuthToken { token } => token.encrypt(plaintext, nonce),
            KeySelector::PermanentToPeer { own, peer } => own.encrypt(plaintext, nonce, peer),
            KeySelector::SessionToPeer { own, peer } => own.encrypt(plaintext, nonce, peer),
        }
    }

    pub fn decrypt(&self, b: &SaltyBox) -> Result<Vec<u8>> {
        match self {
            KeySelector::PermanentToServer { own, server } => own.decrypt(b, server),
            KeySelector::AuthToken { token } => token.decrypt(b),
            KeySelector::PermanentToPeer { own, peer } => own.decrypt(b, peer),
            KeySelector::SessionToPeer { own, peer } => own.decrypt(b, peer),
        }
    }
}
