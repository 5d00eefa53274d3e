//! 16-byte random per-peer tags echoed back in `your_cookie` to bind replies
//! to requests.

#[cfg(test)]
mod cookie_test;

use rand::RngCore;

pub const COOKIE_LENGTH: usize = 16;

/// A 16-byte cookie. Equality is byte-wise.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cookie([u8; COOKIE_LENGTH]);

impl Cookie {
    pub fn new(bytes: [u8; COOKIE_LENGTH]) -> Self {
        Cookie(bytes)
    }

    /// Draw a new cookie from the crypto RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; COOKIE_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Cookie(bytes)
    }

    /// Draw cookies from the crypto RNG until one is found that differs
    /// from `theirs`. Collision probability per draw is 2⁻¹²⁸, so this is a
    /// loop-until-success rather than a bounded retry with a fallback error.
    pub fn random_distinct_from(theirs: &Cookie) -> Self {
        loop {
            let candidate = Cookie::random();
            if &candidate != theirs {
                return candidate;
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8; COOKIE_LENGTH] {
        &self.0
    }
}

impl AsRef<[u8]> for Cookie {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Cookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cookie({})", hex::encode(self.0))
    }
}
