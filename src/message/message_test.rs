use super::*;

#[test]
fn server_hello_round_trips() {
    let msg = Message::ServerHello(ServerHello { key: [9u8; 32] });
    let bytes = msg.to_bytes().unwrap();
    let parsed = Message::from_bytes(&bytes).unwrap();
    match parsed {
        Message::ServerHello(inner) => assert_eq!(inner.key, [9u8; 32]),
        other => panic!("expected server-hello, got {:?}", other),
    }
}

#[test]
fn server_auth_optional_fields_round_trip() {
    let msg = Message::ServerAuth(ServerAuth {
        your_cookie: Cookie::random(),
        responders: Some(vec![0x02, 0x03]),
        initiator_connected: None,
    });
    let bytes = msg.to_bytes().unwrap();
    let parsed = Message::from_bytes(&bytes).unwrap();
    match parsed {
        Message::ServerAuth(inner) => {
            assert_eq!(inner.responders, Some(vec![0x02, 0x03]));
            assert_eq!(inner.initiator_connected, None);
        }
        other => panic!("expected server-auth, got {:?}", other),
    }
}

#[test]
fn drop_responder_carries_id() {
    let msg = Message::DropResponder(DropResponder { id: 0x04 });
    assert_eq!(msg.type_name(), "drop-responder");
    let bytes = msg.to_bytes().unwrap();
    let parsed = Message::from_bytes(&bytes).unwrap();
    match parsed {
        Message::DropResponder(inner) => assert_eq!(inner.id, 0x04),
        other => panic!("expected drop-responder, got {:?}", other),
    }
}

#[test]
fn garbage_bytes_fail_to_parse() {
    assert!(Message::from_bytes(&[0xff, 0xff, 0xff]).is_err());
}
