//! Splits a byte buffer into bounded chunks with a one-bit "more" marker,
//! and reassembles them on the other side. Used only for post-handshake
//! large payloads sent over a data channel; handshake framing itself is
//! always a single frame, unchunked.

#[cfg(test)]
mod chunk_test;

use crate::error::{Error, Result};

const FLAG_MORE: u8 = 0x01;
const FLAG_TERMINAL: u8 = 0x00;

/// Splits `buf` into chunks of at most `chunk_size` bytes, each prefixed
/// with a one-byte continuation flag.
pub struct Chunker<'a> {
    buf: &'a [u8],
    chunk_size: usize,
}

impl<'a> Chunker<'a> {
    /// `chunk_size` is the *total* size of each chunk, flag byte included,
    /// so each chunk carries at most `chunk_size - 1` payload bytes.
    pub fn new(buf: &'a [u8], chunk_size: usize) -> Result<Self> {
        if buf.is_empty() {
            return Err(Error::InvalidArgument("chunker input must not be empty".into()));
        }
        if chunk_size < 2 {
            return Err(Error::InvalidArgument(
                "chunk size must be at least 2 bytes (1 flag + 1 payload)".into(),
            ));
        }
        Ok(Chunker { buf, chunk_size })
    }

    /// The deterministic, restartable sequence of chunks. Re-invoking
    /// `chunks()` yields the same sequence every time.
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        let payload_size = self.chunk_size - 1;
        let mut out = Vec::with_capacity((self.buf.len() + payload_size - 1) / payload_size);
        let mut offset = 0;
        while offset < self.buf.len() {
            let end = std::cmp::min(offset + payload_size, self.buf.len());
            let is_last = end == self.buf.len();
            let mut chunk = Vec::with_capacity(1 + (end - offset));
            chunk.push(if is_last { FLAG_TERMINAL } else { FLAG_MORE });
            chunk.extend_from_slice(&self.buf[offset..end]);
            out.push(chunk);
            offset = end;
        }
        out
    }
}

/// Accumulates chunks produced by a [`Chunker`] and reassembles the
/// original buffer once a terminal chunk has been seen.
#[derive(Default)]
pub struct Dechunker {
    payload: Vec<u8>,
    terminal: bool,
    merged: Option<Vec<u8>>,
}

impl Dechunker {
    pub fn new() -> Self {
        Dechunker::default()
    }

    /// Feed one chunk in. Returns `Ok(true)` iff this chunk was terminal
    /// (flag `0x00`), at which point `merge()` becomes available.
    pub fn add(&mut self, chunk: &[u8]) -> Result<bool> {
        if self.terminal {
            return Err(Error::AlreadyComplete);
        }
        if chunk.is_empty() {
            return Ok(false);
        }

        let flag = chunk[0];
        if flag != FLAG_TERMINAL && flag != FLAG_MORE {
            return Err(Error::InvalidChunk(flag));
        }

        self.payload.extend_from_slice(&chunk[1..]);
        if flag == FLAG_TERMINAL {
            self.terminal = true;
        }
        Ok(self.terminal)
    }

    /// Return the concatenated payload. Idempotent after the first
    /// successful call: the result is cached rather than recomputed.
    pub fn merge(&mut self) -> Result<Vec<u8>> {
        if let Some(merged) = &self.merged {
            return Ok(merged.clone());
        }
        if !self.terminal {
            return Err(Error::NotComplete);
        }
        let merged = std::mem::take(&mut self.payload);
        self.merged = Some(merged.clone());
        Ok(merged)
    }
}
