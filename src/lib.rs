//! A low-level SSH client packet engine.
//!
//! This crate implements the transport layer described by RFC 4253 §6: it
//! frames, decrypts, authenticates, decompresses and dispatches SSH binary
//! packets off a byte stream, and does the reverse on the way out. It
//! intentionally stops there — key exchange, authentication, and channel
//! ownership are all collaborators this crate calls out to
//! ([`kex::KexExchange`], [`channel::ChannelTable`]), not things it
//! implements.
//!
//! The engine is synchronous: every call either returns promptly or blocks
//! in the kernel on the underlying socket. There is no internal executor.

pub mod algorithm;
pub mod brigade;
pub mod callbacks;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod frame;
pub mod io;
pub mod kex;
pub mod keys;
pub mod message;
pub mod packet;
pub mod session;

pub use config::Config;
pub use error::{DisconnectedBy, DisconnectedError, Error, Result};
pub use session::{ReadOutcome, Session};
