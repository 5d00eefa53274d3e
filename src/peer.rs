//! The initiator's per-responder bookkeeping: one [`Peer`] per responder
//! address the initiator has seen, tracking that responder's handshake
//! progress independently of every other responder's.


use crate::crypto::{KeyStore, PublicKey};
use crate::csn::CombinedSequence;
use crate::nonce::Address;

/// Where a given responder stands in the initiator's peer handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// Only the server has told us this address exists; no `token` yet.
    New,
    /// `token` received and validated; we replied with our `key`.
    TokenReceived,
    /// `key` received and validated; we replied with `auth`. One more
    /// valid `auth` from this peer elects it as `chosen`.
    KeyReceived,
}

impl std::fmt::Display for PeerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PeerState::New => "new",
            PeerState::TokenReceived => "token-received",
            PeerState::KeyReceived => "key-received",
        };
        write!(f, "{}", s)
    }
}

/// The initiator's view of one candidate responder.
pub struct Peer {
    pub id: Address,
    pub permanent_pub: Option<PublicKey>,
    pub session_pub: Option<PublicKey>,
    /// The initiator's session keystore dedicated to this responder.
    pub own_session: KeyStore,
    pub state: PeerState,
    /// Outbound CSN for frames the initiator sends to this responder.
    pub csn: CombinedSequence,
}

impl Peer {
    /// A freshly learned responder address, in `New` state with a newly
    /// generated session keystore (lazily — only the initiator ever calls
    /// this, once per responder, not per handshake attempt).
    pub fn new(id: Address) -> Self {
        Peer {
            id,
            permanent_pub: None,
            session_pub: None,
            own_session: KeyStore::new(),
            state: PeerState::New,
            csn: CombinedSequence::new(),
        }
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}
