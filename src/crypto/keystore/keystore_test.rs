use super::*;
use crate::cookie::Cookie;

fn test_nonce() -> Nonce {
    Nonce::new(Cookie::random(), 0x01, 0x02, 0, 1)
}

#[test]
fn encrypt_then_decrypt_round_trips() {
    let alice = KeyStore::new();
    let bob = KeyStore::new();
    let plaintext = b"server-hello payload";
    let nonce = test_nonce();

    let sealed = alice.encrypt(plaintext, nonce, bob.public_key());
    let opened = bob.decrypt(&sealed, alice.public_key()).unwrap();
    assert_eq!(opened, plaintext);
}

#[test]
fn wrong_peer_key_fails_decryption() {
    let alice = KeyStore::new();
    let bob = KeyStore::new();
    let mallory = KeyStore::new();

    let sealed = alice.encrypt(b"top secret", test_nonce(), bob.public_key());
    let err = bob.decrypt(&sealed, mallory.public_key()).unwrap_err();
    assert_eq!(err, Error::DecryptionFailed);
}

#[test]
fn public_key_hex_is_lowercase() {
    let ks = KeyStore::new();
    let hex_repr = ks.public_key().to_hex();
    assert_eq!(hex_repr, hex_repr.to_lowercase());
    assert_eq!(hex_repr.len(), PUBLIC_KEY_LENGTH * 2);
}
