//! The coarse signaling state machine and the finer-grained per-role
//! handshake sub-states it carries during `PeerHandshake`.

#[cfg(test)]
mod state_test;

use std::fmt;

/// The top-level signaling state, the only progress indicator exposed to
/// host code beyond the notification callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    New,
    WsConnecting,
    ServerHandshake,
    PeerHandshake,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalingState::New => "new",
            SignalingState::WsConnecting => "ws-connecting",
            SignalingState::ServerHandshake => "server-handshake",
            SignalingState::PeerHandshake => "peer-handshake",
            SignalingState::Open => "open",
            SignalingState::Closing => "closing",
            SignalingState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// The responder's sub-state while in `PeerHandshake`, tracking progress
/// against the single initiator it talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderHandshakeState {
    New,
    TokenSent,
    KeySent,
    AuthReceived,
}

impl fmt::Display for ResponderHandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponderHandshakeState::New => "new",
            ResponderHandshakeState::TokenSent => "token-sent",
            ResponderHandshakeState::KeySent => "key-sent",
            ResponderHandshakeState::AuthReceived => "auth-received",
        };
        write!(f, "{}", s)
    }
}
