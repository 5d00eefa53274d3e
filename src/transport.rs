//! The byte-frame transport seam the signaling engine is generic over.
//! Concrete transport establishment is out of scope; this trait is what the
//! engine consumes once a connection already exists.

use async_trait::async_trait;

use crate::error::Result;

/// A bidirectional channel carrying opaque binary frames with preserved
/// boundaries: one `send` call corresponds to exactly one `recv` call on the
/// peer's side. Implementations might wrap a WebSocket, an in-memory pipe
/// for tests, or anything else with that property.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Await the next inbound frame. Returns `Ok(None)` when the peer has
    /// closed the channel cleanly.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>>;
}
