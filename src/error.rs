use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes of the signaling core.
///
/// Every variant here is the concrete realization of one of the "kinds" from
/// the protocol description; there is no separate catch-all `ProtocolError`
/// variant; "protocol error" is simply the umbrella term for any of these
/// encountered while driving the handshake state machine.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("bad message length: {0}")]
    BadMessageLength(String),

    #[error("bad message type: expected {expected}, got {actual}")]
    BadMessageType {
        expected: &'static str,
        actual: String,
    },

    #[error("bad message: {0}")]
    BadMessage(String),

    #[error("bad cookie: your_cookie did not match ours")]
    BadCookie,

    #[error("bad nonce source: {0:#04x}")]
    BadNonceSource(u8),

    #[error("bad nonce destination: expected {expected:#04x}, got {actual:#04x}")]
    BadNonceDestination { expected: u8, actual: u8 },

    #[error("bad receiver: {0:#04x} cannot be addressed from this role")]
    BadReceiver(u8),

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid chunk: leading flag byte {0:#04x}")]
    InvalidChunk(u8),

    #[error("dechunker already completed")]
    AlreadyComplete,

    #[error("dechunker has not received a terminal chunk yet")]
    NotComplete,

    #[error("combined sequence number overflow exhausted")]
    OverflowExhausted,

    #[error("server closed the connection: {0}")]
    ServerClosed(String),
}
