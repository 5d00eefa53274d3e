//! Combined sequence number: a conceptual 48-bit monotone counter split into
//! a 32-bit sequence and a 16-bit overflow.


use rand::RngCore;

use crate::error::{Error, Result};

/// A 48-bit monotone counter, represented as `(overflow, sequence)`.
///
/// The initial `sequence` is a uniformly random 32-bit value; the initial
/// `overflow` is always 0. Shared per (local endpoint, remote address) pair;
/// not thread-safe by itself — callers must serialize `next()` per peer,
/// which the single-owner signaling engine does naturally.
#[derive(Debug, Clone, Copy)]
pub struct CombinedSequence {
    sequence: u32,
    overflow: u16,
}

impl CombinedSequence {
    /// A fresh CSN with a random initial sequence number and zero overflow.
    pub fn new() -> Self {
        CombinedSequence {
            sequence: rand::rngs::OsRng.next_u32(),
            overflow: 0,
        }
    }

    #[cfg(test)]
    fn with_initial(sequence: u32, overflow: u16) -> Self {
        CombinedSequence { sequence, overflow }
    }

    /// Advance to the next `(overflow, sequence)` pair and return it. This is
    /// the only way to observe a CSN's value; there is no peek operation.
    ///
    /// If `sequence + 1` would overflow `u32`, `sequence` resets to 0 and
    /// `overflow` increments, failing with `OverflowExhausted` once
    /// `overflow` itself would overflow `u16`.
    pub fn next(&mut self) -> Result<(u16, u32)> {
        if self.sequence == u32::MAX {
            let (next_overflow, overflowed) = self.overflow.overflowing_add(1);
            if overflowed {
                return Err(Error::OverflowExhausted);
            }
            self.overflow = next_overflow;
            self.sequence = 0;
        } else {
            self.sequence += 1;
        }

        Ok((self.overflow, self.sequence))
    }
}

impl Default for CombinedSequence {
    fn default() -> Self {
        CombinedSequence::new()
    }
}
