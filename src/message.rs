//! The structured messages carried as the plaintext of every frame (or, for
//! `client-hello`, as the plaintext of an unencrypted frame). Encoded with
//! MessagePack via `rmp-serde`; the `type` field is the map discriminator.

#[cfg(test)]
mod message_test;

use serde::{Deserialize, Serialize};

use crate::cookie::Cookie;
use crate::error::{Error, Result};
use crate::nonce::Address;

fn cookie_as_bytes<S: serde::Serializer>(cookie: &Cookie, s: S) -> std::result::Result<S::Ok, S::Error> {
    serde_bytes::serialize(cookie.as_bytes(), s)
}

fn cookie_from_bytes<'de, D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Cookie, D::Error> {
    let bytes: serde_bytes::ByteBuf = serde_bytes::deserialize(d)?;
    let arr: [u8; 16] = bytes
        .into_vec()
        .try_into()
        .map_err(|_| serde::de::Error::custom("cookie must be 16 bytes"))?;
    Ok(Cookie::new(arr))
}

fn key_as_bytes<S: serde::Serializer>(key: &[u8; 32], s: S) -> std::result::Result<S::Ok, S::Error> {
    serde_bytes::serialize(key, s)
}

fn key_from_bytes<'de, D: serde::Deserializer<'de>>(d: D) -> std::result::Result<[u8; 32], D::Error> {
    let bytes: serde_bytes::ByteBuf = serde_bytes::deserialize(d)?;
    bytes
        .into_vec()
        .try_into()
        .map_err(|_| serde::de::Error::custom("key must be 32 bytes"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerHello {
    #[serde(serialize_with = "key_as_bytes", deserialize_with = "key_from_bytes")]
    pub key: [u8; 32],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientHello {
    #[serde(serialize_with = "key_as_bytes", deserialize_with = "key_from_bytes")]
    pub key: [u8; 32],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAuth {
    #[serde(
        rename = "your_cookie",
        serialize_with = "cookie_as_bytes",
        deserialize_with = "cookie_from_bytes"
    )]
    pub your_cookie: Cookie,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerAuth {
    #[serde(
        rename = "your_cookie",
        serialize_with = "cookie_as_bytes",
        deserialize_with = "cookie_from_bytes"
    )]
    pub your_cookie: Cookie,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responders: Option<Vec<Address>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_connected: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResponder {
    pub id: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInitiator {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropResponder {
    pub id: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    #[serde(serialize_with = "key_as_bytes", deserialize_with = "key_from_bytes")]
    pub key: [u8; 32],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Key {
    #[serde(serialize_with = "key_as_bytes", deserialize_with = "key_from_bytes")]
    pub key: [u8; 32],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    #[serde(
        rename = "your_cookie",
        serialize_with = "cookie_as_bytes",
        deserialize_with = "cookie_from_bytes"
    )]
    pub your_cookie: Cookie,
}

/// Every structured message exchanged over the signaling channel, tagged by
/// its `type` field on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "server-hello")]
    ServerHello(ServerHello),
    #[serde(rename = "client-hello")]
    ClientHello(ClientHello),
    #[serde(rename = "client-auth")]
    ClientAuth(ClientAuth),
    #[serde(rename = "server-auth")]
    ServerAuth(ServerAuth),
    #[serde(rename = "new-responder")]
    NewResponder(NewResponder),
    #[serde(rename = "new-initiator")]
    NewInitiator(NewInitiator),
    #[serde(rename = "drop-responder")]
    DropResponder(DropResponder),
    #[serde(rename = "token")]
    Token(Token),
    #[serde(rename = "key")]
    Key(Key),
    #[serde(rename = "auth")]
    Auth(Auth),
}

impl Message {
    /// The `type` discriminator, used in error messages and log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Message::ServerHello(_) => "server-hello",
            Message::ClientHello(_) => "client-hello",
            Message::ClientAuth(_) => "client-auth",
            Message::ServerAuth(_) => "server-auth",
            Message::NewResponder(_) => "new-responder",
            Message::NewInitiator(_) => "new-initiator",
            Message::DropResponder(_) => "drop-responder",
            Message::Token(_) => "token",
            Message::Key(_) => "key",
            Message::Auth(_) => "auth",
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| Error::BadMessage(e.to_string()))
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(buf).map_err(|e| Error::BadMessage(e.to_string()))
    }
}
