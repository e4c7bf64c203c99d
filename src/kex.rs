//! The key-(re)exchange collaborator hook.
//!
//! Diffie-Hellman, the transcript hash and the key derivation function all
//! live outside this crate. What lives here is the reentrancy contract: on
//! `KEXINIT`, the dispatcher calls back into this trait *while still on its
//! own call stack*, and the implementation is free to read and write packets
//! through the very [`crate::session::Session`] it was handed before
//! returning.

use crate::error::Result;
use crate::io::Pipe;
use crate::session::Session;

/// Performs a (re)key exchange to completion.
pub trait KexExchange<P: Pipe> {
    /// Drive a full key exchange over `session`, installing fresh
    /// [`crate::keys::Keys`] on both endpoints via [`crate::endpoint::Endpoint::rekey`]
    /// before returning.
    ///
    /// `rekey` is `true` when this is a re-exchange of an already-running
    /// session (as opposed to the very first exchange after the version
    /// banner).
    fn exchange(&mut self, session: &mut Session<P>, rekey: bool) -> Result<()>;
}

/// A [`KexExchange`] that does nothing, for engines that want to observe
/// `KEXINIT` arriving in the brigade without ever driving a real exchange
/// (e.g. tests exercising only the framing and dispatch layers).
#[derive(Debug, Default)]
pub struct NoopKex;

impl<P: Pipe> KexExchange<P> for NoopKex {
    fn exchange(&mut self, _session: &mut Session<P>, _rekey: bool) -> Result<()> {
        Ok(())
    }
}
