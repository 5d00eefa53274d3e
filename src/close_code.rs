//! WebSocket close codes used by the relay and its clients to signal why a
//! connection went down. These travel as the numeric close code of the
//! underlying WebSocket close frame, not as part of any [`crate::message`].


use std::fmt;

/// A close code understood by this protocol. `From<u16>`/`Into<u16>` round
/// trip every value; unknown codes outside the defined ranges are preserved
/// losslessly via [`CloseCode::Other`] rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    GoingAway,
    SubprotocolError,
    PathFull,
    ProtocolError,
    InternalError,
    Handover,
    Dropped,
    Other(u16),
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        match code {
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::SubprotocolError,
            3000 => CloseCode::PathFull,
            3001 => CloseCode::ProtocolError,
            3002 => CloseCode::InternalError,
            3003 => CloseCode::Handover,
            3004 => CloseCode::Dropped,
            other => CloseCode::Other(other),
        }
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        match code {
            CloseCode::GoingAway => 1001,
            CloseCode::SubprotocolError => 1002,
            CloseCode::PathFull => 3000,
            CloseCode::ProtocolError => 3001,
            CloseCode::InternalError => 3002,
            CloseCode::Handover => 3003,
            CloseCode::Dropped => 3004,
            CloseCode::Other(code) => code,
        }
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CloseCode::GoingAway => "going-away",
            CloseCode::SubprotocolError => "subprotocol-error",
            CloseCode::PathFull => "path-full",
            CloseCode::ProtocolError => "protocol-error",
            CloseCode::InternalError => "internal-error",
            CloseCode::Handover => "handover",
            CloseCode::Dropped => "dropped",
            CloseCode::Other(_) => "other",
        };
        write!(f, "{} ({})", name, u16::from(*self))
    }
}
