
use std::collections::HashMap;

use log::{debug, error, trace, warn};

use crate::cookie::Cookie;
use crate::crypto::{Box as SaltyBox, KeyStore, PublicKey};
use crate::csn::CombinedSequence;
use crate::error::{Error, Result};
use crate::message::{
    Auth, ClientAuth, ClientHello, DropResponder, Key, Message, ServerAuth, Token,
};
use crate::nonce::{is_responder_address, Address, Nonce, ADDR_INITIATOR, ADDR_SERVER, NONCE_LENGTH};
use crate::peer::{Peer, PeerState};
use crate::state::{ResponderHandshakeState, SignalingState};
use crate::transport::Transport;

use super::config::{Role, SignalingConfig};
use super::key_select::KeySelector;

struct CookiePair {
    ours: Cookie,
    theirs: Cookie,
}

struct InitiatorState {
    peers: HashMap<Address, Peer>,
    chosen: Option<Peer>,
}

impl InitiatorState {
    fn new() -> Self {
        InitiatorState {
            peers: HashMap::new(),
            chosen: None,
        }
    }
}

struct ResponderState {
    initiator_connected: bool,
    initiator_session_pub: Option<PublicKey>,
    own_session: Option<KeyStore>,
    initiator_csn: CombinedSequence,
    sub_state: ResponderHandshakeState,
}

impl ResponderState {
    fn new() -> Self {
        ResponderState {
            initiator_connected: false,
            initiator_session_pub: None,
            own_session: None,
            initiator_csn: CombinedSequence::new(),
            sub_state: ResponderHandshakeState::New,
        }
    }
}

enum RoleState {
    Initiator(InitiatorState),
    Responder(ResponderState),
}

impl RoleState {
    fn fresh(role: Role) -> Self {
        match role {
            Role::Initiator => RoleState::Initiator(InitiatorState::new()),
            Role::Responder => RoleState::Responder(ResponderState::new()),
        }
    }
}

/// Drives one side of the handshake to `Open` over a concrete [`Transport`].
///
/// The bulk of the protocol logic lives in [`SignalingEngine::handle_frame`],
/// a synchronous `step(inbound) -> outbound*` function that can be (and is)
/// unit tested without any transport at all; [`SignalingEngine::connect`] is
/// the thin async loop that feeds it from a real transport.
pub struct SignalingEngine<T: Transport> {
    config: SignalingConfig,
    transport: T,
    state: SignalingState,
    self_address: Option<Address>,
    server_pubkey: Option<PublicKey>,
    cookies: Option<CookiePair>,
    server_csn: CombinedSequence,
    role_state: RoleState,
}

impl<T: Transport> SignalingEngine<T> {
    pub fn new(config: SignalingConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let role_state = RoleState::fresh(config.role);
        Ok(SignalingEngine {
            config,
            transport,
            state: SignalingState::New,
            self_address: None,
            server_pubkey: None,
            cookies: None,
            server_csn: CombinedSequence::new(),
            role_state,
        })
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    /// Drive the handshake to completion, sending and receiving frames over
    /// the transport until the engine reaches `Open` or a fatal error
    /// occurs.
    pub async fn connect(&mut self) -> Result<()> {
        loop {
            let frame = match self.transport.recv().await? {
                Some(frame) => frame,
                None => {
                    debug!("transport closed before handshake completed");
                    self.state = SignalingState::Closed;
                    return Err(Error::ServerClosed(
                        "transport closed before handshake completed".into(),
                    ));
                }
            };

            let outbound = self.handle_frame(&frame)?;
            for frame in outbound {
                self.transport.send(&frame).await?;
            }
            if self.state == SignalingState::Open {
                return Ok(());
            }
        }
    }

    /// Idempotently tear the engine down: transition to `Closed` and drop
    /// all key material and peer bookkeeping. Does not touch the transport;
    /// callers close it separately.
    pub fn close(&mut self) {
        self.state = SignalingState::Closed;
        self.self_address = None;
        self.server_pubkey = None;
        self.cookies = None;
        self.role_state = RoleState::fresh(self.config.role);
    }

    fn reset(&mut self) {
        self.state = SignalingState::New;
        self.self_address = None;
        self.server_pubkey = None;
        self.cookies = None;
        self.server_csn = CombinedSequence::new();
        self.role_state = RoleState::fresh(self.config.role);
    }

    /// The single entry point for inbound frames: peek or decrypt, update
    /// state, and return zero or more outbound frames ready to send. Any
    /// `Err` here means the protocol aborted; the engine has already reset
    /// itself to `New` by the time it returns.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<Vec<Vec<u8>>> {
        match self.dispatch_frame(frame) {
            Ok(outbound) => Ok(outbound),
            Err(e) => {
                error!("aborting signaling: {}", e);
                self.reset();
                Err(e)
            }
        }
    }

    fn dispatch_frame(&mut self, frame: &[u8]) -> Result<Vec<Vec<u8>>> {
        if self.server_pubkey.is_none() {
            return self.handle_server_hello(frame);
        }
        if self.state == SignalingState::ServerHandshake {
            return self.handle_server_auth(frame);
        }
        self.handle_peer_frame(frame)
    }

    fn handle_server_hello(&mut self, frame: &[u8]) -> Result<Vec<Vec<u8>>> {
        let nonce = Nonce::from_bytes(frame)?;
        let plaintext = &frame[NONCE_LENGTH..];
        let msg = Message::from_bytes(plaintext)?;
        let server_hello = match msg {
            Message::ServerHello(inner) => inner,
            other => {
                return Err(Error::BadMessageType {
                    expected: "server-hello",
                    actual: other.type_name().into(),
                })
            }
        };
        trace!("received server-hello");

        self.state = SignalingState::ServerHandshake;
        self.server_pubkey = Some(PublicKey::from_bytes(server_hello.key));
        let ours = Cookie::random_distinct_from(&nonce.cookie);
        self.cookies = Some(CookiePair {
            ours,
            theirs: nonce.cookie,
        });

        if self.config.role == Role::Initiator {
            self.self_address = Some(ADDR_INITIATOR);
        }

        let mut outbound = Vec::new();
        if self.config.role == Role::Responder {
            outbound.push(self.build_client_hello()?);
        }
        outbound.push(self.build_client_auth()?);
        Ok(outbound)
    }

    fn handle_server_auth(&mut self, frame: &[u8]) -> Result<Vec<Vec<u8>>> {
        let b = SaltyBox::from_bytes(frame)?;
        let server_pubkey = self
            .server_pubkey
            .clone()
            .expect("server pubkey set by handle_server_hello");
        let plaintext = self.config.permanent_key.decrypt(&b, &server_pubkey)?;
        let nonce = Nonce::from_bytes(&b.nonce)?;

        match self.config.role {
            Role::Initiator => {
                if nonce.source != ADDR_SERVER {
                    return Err(Error::BadNonceSource(nonce.source));
                }
                if nonce.destination != ADDR_INITIATOR {
                    return Err(Error::BadNonceDestination {
                        expected: ADDR_INITIATOR,
                        actual: nonce.destination,
                    });
                }
            }
            Role::Responder => {
                if nonce.source != ADDR_SERVER {
                    return Err(Error::BadNonceSource(nonce.source));
                }
                if !is_responder_address(nonce.destination) {
                    return Err(Error::BadNonceDestination {
                        expected: 0x02,
                        actual: nonce.destination,
                    });
                }
                self.self_address = Some(nonce.destination);
            }
        }

        let msg = Message::from_bytes(&plaintext)?;
        let server_auth = match msg {
            Message::ServerAuth(inner) => inner,
            other => {
                return Err(Error::BadMessageType {
                    expected: "server-auth",
                    actual: other.type_name().into(),
                })
            }
        };
        self.validate_your_cookie(&server_auth)?;
        debug!("server handshake complete, entering peer handshake");

        match &mut self.role_state {
            RoleState::Initiator(state) => {
                for id in server_auth.responders.unwrap_or_default() {
                    state.peers.entry(id).or_insert_with(|| Peer::new(id));
                }
            }
            RoleState::Responder(state) => {
                state.initiator_connected = server_auth.initiator_connected.unwrap_or(false);
            }
        }

        self.state = SignalingState::PeerHandshake;

        let should_send_token = matches!(
            &self.role_state,
            RoleState::Responder(state)
                if state.initiator_connected && state.sub_state == ResponderHandshakeState::New
        );
        let mut outbound = Vec::new();
        if should_send_token {
            outbound.push(self.send_token()?);
        }
        Ok(outbound)
    }

    fn validate_your_cookie(&self, server_auth: &ServerAuth) -> Result<()> {
        let cookies = self
            .cookies
            .as_ref()
            .expect("cookie pair set in server-hello");
        if server_auth.your_cookie != cookies.ours {
            return Err(Error::BadCookie);
        }
        Ok(())
    }

    fn handle_peer_frame(&mut self, frame: &[u8]) -> Result<Vec<Vec<u8>>> {
        let nonce = Nonce::from_bytes(frame)?;
        if let Some(addr) = self.self_address {
            if nonce.destination != addr {
                return Err(Error::BadNonceDestination {
                    expected: addr,
                    actual: nonce.destination,
                });
            }
        }

        match nonce.source {
            ADDR_SERVER => self.handle_server_message(frame),
            ADDR_INITIATOR => match self.config.role {
                Role::Responder => self.handle_from_initiator(frame, nonce),
                Role::Initiator => Err(Error::BadNonceSource(nonce.source)),
            },
            s if is_responder_address(s) => match self.config.role {
                Role::Initiator => self.handle_from_responder(frame, s, nonce),
                Role::Responder => Err(Error::BadNonceSource(nonce.source)),
            },
            other => Err(Error::BadNonceSource(other)),
        }
    }

    fn handle_server_message(&mut self, frame: &[u8]) -> Result<Vec<Vec<u8>>> {
        let b = SaltyBox::from_bytes(frame)?;
        let server_pubkey = self
            .server_pubkey
            .clone()
            .expect("server pubkey already known");
        let plaintext = {
            let selector = KeySelector::PermanentToServer {
                own: &self.config.permanent_key,
                server: &server_pubkey,
            };
            selector.decrypt(&b)?
        };
        let msg = Message::from_bytes(&plaintext)?;

        match msg {
            Message::NewResponder(nr) => {
                if let RoleState::Initiator(state) = &mut self.role_state {
                    if state.peers.contains_key(&nr.id) {
                        warn!("server announced already-known responder {:#04x}", nr.id);
                    } else {
                        debug!("server announced new responder {:#04x}", nr.id);
                        state.peers.insert(nr.id, Peer::new(nr.id));
                    }
                }
                Ok(vec![])
            }
            Message::NewInitiator(_) => {
                let should_send_token = match &mut self.role_state {
                    RoleState::Responder(state) => {
                        state.initiator_connected = true;
                        state.sub_state == ResponderHandshakeState::New
                    }
                    RoleState::Initiator(_) => false,
                };
                if should_send_token {
                    Ok(vec![self.send_token()?])
                } else {
                    Ok(vec![])
                }
            }
            other => {
                warn!(
                    "ignoring unexpected server message {} during peer handshake",
                    other.type_name()
                );
                Ok(vec![])
            }
        }
    }

    fn send_token(&mut self) -> Result<Vec<u8>> {
        let token_msg = Message::Token(Token {
            key: *self.config.permanent_key.public_key().as_bytes(),
        });
        let frame = self.encrypt_and_frame(ADDR_INITIATOR, &token_msg)?;
        if let RoleState::Responder(state) = &mut self.role_state {
            state.sub_state = ResponderHandshakeState::TokenSent;
        }
        Ok(frame)
    }

    fn handle_from_initiator(&mut self, frame: &[u8], nonce: Nonce) -> Result<Vec<Vec<u8>>> {
        let b = SaltyBox::from_bytes(frame)?;
        let sub_state = match &self.role_state {
            RoleState::Responder(state) => state.sub_state,
            RoleState::Initiator(_) => unreachable!("only reached for the responder role"),
        };

        match sub_state {
            ResponderHandshakeState::New | ResponderHandshakeState::AuthReceived => {
                Err(Error::BadMessage(format!(
                    "unexpected inbound from initiator while in sub-state {}",
                    sub_state
                )))
            }
            ResponderHandshakeState::TokenSent => {
                let initiator_pubkey = self
                    .config
                    .initiator_pubkey
                    .clone()
                    .expect("validated present for responder role");
                let plaintext = {
                    let selector = KeySelector::PermanentToPeer {
                        own: &self.config.permanent_key,
                        peer: &initiator_pubkey,
                    };
                    selector.decrypt(&b)?
                };
                let msg = Message::from_bytes(&plaintext)?;
                let key_msg = match msg {
                    Message::Key(inner) => inner,
                    other => {
                        return Err(Error::BadMessageType {
                            expected: "key",
                            actual: other.type_name().into(),
                        })
                    }
                };

                let own_session = KeyStore::new();
                let reply = Message::Key(Key {
                    key: *own_session.public_key().as_bytes(),
                });
                if let RoleState::Responder(state) = &mut self.role_state {
                    state.initiator_session_pub = Some(PublicKey::from_bytes(key_msg.key));
                    state.own_session = Some(own_session);
                    state.sub_state = ResponderHandshakeState::KeySent;
                }
                let frame = self.encrypt_and_frame(ADDR_INITIATOR, &reply)?;
                Ok(vec![frame])
            }
            ResponderHandshakeState::KeySent => {
                let peer_session = match &self.role_state {
                    RoleState::Responder(state) => state
                        .initiator_session_pub
                        .clone()
                        .expect("set when entering KeySent"),
                    RoleState::Initiator(_) => unreachable!(),
                };
                let plaintext = {
                    let selector = match &self.role_state {
                        RoleState::Responder(state) => KeySelector::SessionToPeer {
                            own: state.own_session.as_ref().expect("set when entering KeySent"),
                            peer: &peer_session,
                        },
                        RoleState::Initiator(_) => unreachable!(),
                    };
                    selector.decrypt(&b)?
                };
                let msg = Message::from_bytes(&plaintext)?;
                let auth_msg = match msg {
                    Message::Auth(inner) => inner,
                    other => {
                        return Err(Error::BadMessageType {
                            expected: "auth",
                            actual: other.type_name().into(),
                        })
                    }
                };
                let cookies = self
                    .cookies
                    .as_ref()
                    .expect("cookie pair set in server-hello");
                if auth_msg.your_cookie != cookies.ours {
                    return Err(Error::BadCookie);
                }
                if nonce.cookie == cookies.ours {
                    return Err(Error::BadCookie);
                }

                let reply = Message::Auth(Auth {
                    your_cookie: nonce.cookie,
                });
                let frame = self.encrypt_and_frame(ADDR_INITIATOR, &reply)?;
                if let RoleState::Responder(state) = &mut self.role_state {
                    state.sub_state = ResponderHandshakeState::AuthReceived;
                }
                self.state = SignalingState::Open;
                debug!("peer handshake complete as responder");
                Ok(vec![frame])
            }
        }
    }

    fn handle_from_responder(
        &mut self,
        frame: &[u8],
        source: Address,
        nonce: Nonce,
    ) -> Result<Vec<Vec<u8>>> {
        let mut peer = {
            let state = match &mut self.role_state {
                RoleState::Initiator(state) => state,
                RoleState::Responder(_) => unreachable!("only reached for the initiator role"),
            };
            match state.peers.remove(&source) {
                Some(peer) => peer,
                None => {
                    warn!("dropping frame from unknown responder {:#04x}", source);
                    return Ok(vec![]);
                }
            }
        };

        let entering_state = peer.state;
        let b = SaltyBox::from_bytes(frame)?;

        let out_frame = match entering_state {
            PeerState::New => {
                let plaintext = {
                    let token = self
                        .config
                        .auth_token
                        .as_ref()
                        .expect("validated present for either role");
                    let selector = KeySelector::AuthToken { token };
                    selector.decrypt(&b)?
                };
                let msg = Message::from_bytes(&plaintext)?;
                let token_msg = match msg {
                    Message::Token(inner) => inner,
                    other => {
                        return Err(Error::BadMessageType {
                            expected: "token",
                            actual: other.type_name().into(),
                        })
                    }
                };
                peer.permanent_pub = Some(PublicKey::from_bytes(token_msg.key));
                peer.state = PeerState::TokenReceived;

                let reply = Message::Key(Key {
                    key: *peer.own_session.public_key().as_bytes(),
                });
                let peer_pub = peer.permanent_pub.expect("just set above");
                let (overflow, sequence) = peer.csn.next()?;
                let cookies_ours = self.cookies.as_ref().expect("set in server-hello").ours;
                let out_nonce = Nonce::new(
                    cookies_ours,
                    self.self_address.unwrap_or(ADDR_INITIATOR),
                    source,
                    overflow,
                    sequence,
                );
                let selector = KeySelector::PermanentToPeer {
                    own: &self.config.permanent_key,
                    peer: &peer_pub,
                };
                let reply_bytes = reply.to_bytes()?;
                selector.encrypt(&reply_bytes, out_nonce).to_bytes()
            }
            PeerState::TokenReceived => {
                let peer_pub = peer
                    .permanent_pub
                    .expect("set when entering TokenReceived");
                let plaintext = {
                    let selector = KeySelector::PermanentToPeer {
                        own: &self.config.permanent_key,
                        peer: &peer_pub,
                    };
                    selector.decrypt(&b)?
                };
                let msg = Message::from_bytes(&plaintext)?;
                let key_msg = match msg {
                    Message::Key(inner) => inner,
                    other => {
                        return Err(Error::BadMessageType {
                            expected: "key",
                            actual: other.type_name().into(),
                        })
                    }
                };
                peer.session_pub = Some(PublicKey::from_bytes(key_msg.key));
                peer.state = PeerState::KeyReceived;

                let cookies = self.cookies.as_ref().expect("set in server-hello");
                if nonce.cookie == cookies.ours {
                    return Err(Error::BadCookie);
                }
                let reply = Message::Auth(Auth {
                    your_cookie: nonce.cookie,
                });
                let peer_session = peer.session_pub.expect("just set above");
                let (overflow, sequence) = peer.csn.next()?;
                let out_nonce = Nonce::new(
                    cookies.ours,
                    self.self_address.unwrap_or(ADDR_INITIATOR),
                    source,
                    overflow,
                    sequence,
                );
                let selector = KeySelector::SessionToPeer {
                    own: &peer.own_session,
                    peer: &peer_session,
                };
                let reply_bytes = reply.to_bytes()?;
                selector.encrypt(&reply_bytes, out_nonce).to_bytes()
            }
            PeerState::KeyReceived => {
                let peer_session = peer
                    .session_pub
                    .expect("set when entering KeyReceived");
                let plaintext = {
                    let selector = KeySelector::SessionToPeer {
                        own: &peer.own_session,
                        peer: &peer_session,
                    };
                    selector.decrypt(&b)?
                };
                let msg = Message::from_bytes(&plaintext)?;
                let auth_msg = match msg {
                    Message::Auth(inner) => inner,
                    other => {
                        return Err(Error::BadMessageType {
                            expected: "auth",
                            actual: other.type_name().into(),
                        })
                    }
                };
                let cookies = self.cookies.as_ref().expect("set in server-hello");
                if auth_msg.your_cookie != cookies.ours {
                    return Err(Error::BadCookie);
                }
                Vec::new()
            }
        };

        if entering_state == PeerState::KeyReceived {
            let remaining_ids: Vec<Address> = match &self.role_state {
                RoleState::Initiator(state) => state.peers.keys().copied().collect(),
                RoleState::Responder(_) => unreachable!(),
            };
            let mut outbound = Vec::new();
            for id in remaining_ids {
                let drop_msg = Message::DropResponder(DropResponder { id });
                outbound.push(self.encrypt_and_frame(ADDR_SERVER, &drop_msg)?);
            }
            if let RoleState::Initiator(state) = &mut self.role_state {
                state.peers.clear();
                state.chosen = Some(peer);
            }
            self.state = SignalingState::Open;
            debug!("elected responder {:#04x}", source);
            Ok(outbound)
        } else {
            if let RoleState::Initiator(state) = &mut self.role_state {
                state.peers.insert(source, peer);
            }
            Ok(vec![out_frame])
        }
    }

    /// Resolve the key pairing for one outbound frame, per the matrix of
    /// §4.6. Only covers destinations `encrypt_and_frame` is actually used
    /// for (the server, and the responder's sends to the initiator); the
    /// initiator's per-responder sends are built directly in
    /// `handle_from_responder`, where the `Peer` is already an owned local.
    fn select_key(&self, destination: Address, message_type: &str) -> Result<KeySelector<'_>> {
        match destination {
            ADDR_SERVER => Ok(KeySelector::PermanentToServer {
                own: &self.config.permanent_key,
                server: self
                    .server_pubkey
                    .as_ref()
                    .expect("server pubkey known before any send"),
            }),
            ADDR_INITIATOR if self.config.role == Role::Responder => match message_type {
                "token" => Ok(KeySelector::AuthToken {
                    token: self
                        .config
                        .auth_token
                        .as_ref()
                        .expect("validated present"),
                }),
                "key" => Ok(KeySelector::PermanentToPeer {
                    own: &self.config.permanent_key,
                    peer: self
                        .config
                        .initiator_pubkey
                        .as_ref()
                        .expect("validated present for responder role"),
                }),
                _ => match &self.role_state {
                    RoleState::Responder(state) => Ok(KeySelector::SessionToPeer {
                        own: state
                            .own_session
                            .as_ref()
                            .expect("set before any session-keyed send"),
                        peer: state
                            .initiator_session_pub
                            .as_ref()
                            .expect("set before any session-keyed send"),
                    }),
                    RoleState::Initiator(_) => unreachable!(),
                },
            },
            _ => Err(Error::BadReceiver(destination)),
        }
    }

    /// Build, key-select, and frame one outbound message to `destination`.
    fn encrypt_and_frame(&mut self, destination: Address, msg: &Message) -> Result<Vec<u8>> {
        let plaintext = msg.to_bytes()?;
        let nonce = self.build_nonce(destination)?;
        let selector = self.select_key(destination, msg.type_name())?;
        Ok(selector.encrypt(&plaintext, nonce).to_bytes())
    }

    fn build_nonce(&mut self, destination: Address) -> Result<Nonce> {
        let (overflow, sequence) = self.next_csn_for(destination)?;
        let cookies = self
            .cookies
            .as_ref()
            .expect("cookie pair set after server-hello");
        Ok(Nonce::new(
            cookies.ours,
            self.self_address.unwrap_or(0),
            destination,
            overflow,
            sequence,
        ))
    }

    fn next_csn_for(&mut self, destination: Address) -> Result<(u16, u32)> {
        if destination == ADDR_SERVER {
            return self.server_csn.next();
        }
        match &mut self.role_state {
            RoleState::Responder(state) if destination == ADDR_INITIATOR => {
                state.initiator_csn.next()
            }
            _ => Err(Error::BadReceiver(destination)),
        }
    }

    fn build_client_hello(&mut self) -> Result<Vec<u8>> {
        let msg = Message::ClientHello(ClientHello {
            key: *self.config.permanent_key.public_key().as_bytes(),
        });
        let plaintext = msg.to_bytes()?;
        let nonce = self.build_nonce(ADDR_SERVER)?;
        let mut frame = Vec::with_capacity(NONCE_LENGTH + plaintext.len());
        frame.extend_from_slice(&nonce.to_bytes());
        frame.extend_from_slice(&plaintext);
        Ok(frame)
    }

    fn build_client_auth(&mut self) -> Result<Vec<u8>> {
        let theirs = self
            .cookies
            .as_ref()
            .expect("set in handle_server_hello")
            .theirs;
        let msg = Message::ClientAuth(ClientAuth { your_cookie: theirs });
        self.encrypt_and_frame(ADDR_SERVER, &msg)
    }
}
