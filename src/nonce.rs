//! The 24-byte wire nonce: `cookie‖source‖destination‖overflow‖sequence`.


use std::fmt;

use crate::cookie::{Cookie, COOKIE_LENGTH};
use crate::error::{Error, Result};

pub const NONCE_LENGTH: usize = 24;

/// A 1-byte routing identifier. `0x00` is the server, `0x01` the initiator,
/// `0x02..=0xff` responder slots assigned by the server.
pub type Address = u8;

pub const ADDR_SERVER: Address = 0x00;
pub const ADDR_INITIATOR: Address = 0x01;

pub fn is_responder_address(addr: Address) -> bool {
    addr >= 0x02
}

/// A parsed 24-byte nonce. Parsing never rejects anything at this layer —
/// authentication happens one layer up, via AEAD decryption. Until a frame
/// has been decrypted, only `source`/`destination` may be "peeked" to pick
/// a decryption key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce {
    pub cookie: Cookie,
    pub source: Address,
    pub destination: Address,
    pub overflow: u16,
    pub sequence: u32,
}

impl Nonce {
    pub fn new(
        cookie: Cookie,
        source: Address,
        destination: Address,
        overflow: u16,
        sequence: u32,
    ) -> Self {
        Nonce {
            cookie,
            source,
            destination,
            overflow,
            sequence,
        }
    }

    /// Parse a nonce out of the first 24 bytes of `buf`. Does not require
    /// `buf.len() == 24`; only the leading `NONCE_LENGTH` bytes are read.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < NONCE_LENGTH {
            return Err(Error::BadMessageLength(format!(
                "nonce requires {} bytes, got {}",
                NONCE_LENGTH,
                buf.len()
            )));
        }

        let mut cookie_bytes = [0u8; COOKIE_LENGTH];
        cookie_bytes.copy_from_slice(&buf[0..16]);

        let overflow = u16::from_be_bytes([buf[18], buf[19]]);
        let sequence = u32::from_be_bytes([buf[20], buf[21], buf[22], buf[23]]);

        Ok(Nonce {
            cookie: Cookie::new(cookie_bytes),
            source: buf[16],
            destination: buf[17],
            overflow,
            sequence,
        })
    }

    pub fn to_bytes(self) -> [u8; NONCE_LENGTH] {
        let mut out = [0u8; NONCE_LENGTH];
        out[0..16].copy_from_slice(self.cookie.as_ref());
        out[16] = self.source;
        out[17] = self.destination;
        out[18..20].copy_from_slice(&self.overflow.to_be_bytes());
        out[20..24].copy_from_slice(&self.sequence.to_be_bytes());
        out
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Nonce(src={:#04x} dst={:#04x} csn=({},{}))",
            self.source, self.destination, self.overflow, self.sequence
        )
    }
}
