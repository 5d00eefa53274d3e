use super::*;

#[test]
fn signaling_state_display_is_kebab_case() {
    assert_eq!(SignalingState::PeerHandshake.to_string(), "peer-handshake");
    assert_eq!(SignalingState::Open.to_string(), "open");
}

#[test]
fn responder_handshake_state_display_is_kebab_case() {
    assert_eq!(ResponderHandshakeState::TokenSent.to_string(), "token-sent");
    assert_eq!(
        ResponderHandshakeState::AuthReceived.to_string(),
        "auth-received"
    );
}

#[test]
fn states_are_copy_and_comparable() {
    let a = SignalingState::New;
    let b = a;
    assert_eq!(a, b);
}
