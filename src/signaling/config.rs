
use crate::crypto::{AuthToken, KeyStore, PublicKey};
use crate::error::{Error, Result};

/// The 16 KiB data-channel limit referenced in §6 of the wire format,
/// carried over here as the chunker's default chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Which side of the handshake this engine instance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Everything the engine needs before it can drive a handshake, as opposed
/// to state it accumulates while driving one.
pub struct SignalingConfig {
    pub role: Role,
    /// This endpoint's long-lived identity keypair.
    pub permanent_key: KeyStore,
    /// The secret generated once by the initiator and conveyed out-of-band
    /// to exactly one responder; both roles must hold the same bytes.
    pub auth_token: Option<AuthToken>,
    /// The initiator's permanent public key. Required for the responder
    /// role (it is how the responder addresses and authenticates the
    /// initiator); unused by the initiator role, which already owns that
    /// key via `permanent_key`.
    pub initiator_pubkey: Option<PublicKey>,
    /// Size, including the flag byte, of chunks produced by
    /// [`crate::chunk::Chunker`] for post-handshake payloads.
    pub chunk_size: usize,
}

impl SignalingConfig {
    pub fn new_initiator(permanent_key: KeyStore, auth_token: AuthToken) -> Self {
        SignalingConfig {
            role: Role::Initiator,
            permanent_key,
            auth_token: Some(auth_token),
            initiator_pubkey: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn new_responder(
        permanent_key: KeyStore,
        auth_token: AuthToken,
        initiator_pubkey: PublicKey,
    ) -> Self {
        SignalingConfig {
            role: Role::Responder,
            permanent_key,
            auth_token: Some(auth_token),
            initiator_pubkey: Some(initiator_pubkey),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Reject configurations the engine cannot run a handshake with. Called
    /// from `SignalingEngine::new`.
    pub fn validate(&self) -> Result<()> {
        if self.auth_token.is_none() {
            return Err(Error::InvalidArgument(
                "signaling config requires an auth token for either role".into(),
            ));
        }
        if self.role == Role::Responder && self.initiator_pubkey.is_none() {
            return Err(Error::InvalidArgument(
                "responder config requires the initiator's permanent public key".into(),
            ));
        }
        if self.chunk_size < 2 {
            return Err(Error::InvalidArgument(
                "chunk size must be at least 2 bytes".into(),
            ));
        }
        Ok(())
    }
}
