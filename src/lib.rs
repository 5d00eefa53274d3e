#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod chunk;
pub mod close_code;
pub mod cookie;
pub mod crypto;
pub mod csn;
pub mod error;
pub mod message;
pub mod nonce;
pub mod peer;
pub mod signaling;
pub mod state;
pub mod transport;

pub use close_code::CloseCode;
pub use cookie::Cookie;
pub use crypto::{AuthToken, Box as SaltyBox, KeyStore, PublicKey};
pub use csn::CombinedSequence;
pub use error::{Error, Result};
pub use nonce::{Address, Nonce};
pub use signaling::{Role, SignalingConfig, SignalingEngine};
pub use state::SignalingState;
pub use transport::Transport;
