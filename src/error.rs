//! Collection of error handling types and aliases.

use thiserror::Error;

/// The disconnection side for [`DisconnectedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectedBy {
    /// The session has been disconnected by _us_.
    Us,

    /// The session has been disconnected by _them_.
    Them,
}

/// The error type describing a completed disconnection.
#[must_use]
#[derive(Debug, Error, Clone)]
#[error("The session has been disconnected by {by:?} for {reason}: {description}")]
pub struct DisconnectedError {
    /// Side that sent the disconnect message.
    pub by: DisconnectedBy,

    /// Reason code for disconnect, as defined in RFC 4253 §11.1.
    pub reason: u32,

    /// Description of the disconnect reason.
    pub description: String,

    /// Language tag for the description, may be empty.
    pub language: String,
}

/// The error types that can occur when operating this crate's packet engine.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading or writing the underlying socket.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Packet integrity error: the MAC received did not match what was computed.
    #[error("Invalid Message Authentication Code received")]
    InvalidMac,

    /// An error occurred while encrypting or decrypting a frame.
    #[error("The cipher ended up in an error")]
    Decrypt,

    /// A decoded frame violated the framing invariants (size, alignment, padding).
    #[error("Fatal protocol error: {0}")]
    Proto(&'static str),

    /// Ran out of polling attempts waiting for the peer to produce the next byte.
    #[error("Timed out waiting for data after {0} poll attempts")]
    PollTimeout(u32),

    /// The session has been disconnected, either by us or by the peer.
    #[error(transparent)]
    Disconnected(#[from] DisconnectedError),

    /// A packet referenced a channel id the caller's channel table doesn't know about.
    ///
    /// Non-fatal: surfaced to the caller's warning sink, never from `packet_read` directly.
    #[error("Packet received for unknown channel {0}, ignoring")]
    ChannelUnknown(u32),

    /// A channel data packet exceeded the receiver's advertised `packet_size`.
    ///
    /// Non-fatal.
    #[error("Packet on channel {0} contains more data than we offered to receive, truncating")]
    ChannelPacketExceeded(u32),

    /// A channel data packet exceeded the receiver's advertised flow-control window.
    ///
    /// Non-fatal.
    #[error("The receive window on channel {0} is exceeded")]
    ChannelWindowExceeded(u32),
}

impl Error {
    /// Whether this error kind is fatal to the session (transitions it to `Disconnected`
    /// and makes subsequent engine calls return immediately), as opposed to the
    /// channel-level kinds which are reported as warnings only.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ChannelUnknown(_) | Self::ChannelPacketExceeded(_) | Self::ChannelWindowExceeded(_)
        )
    }
}

/// A handy [`std::result::Result`] type alias bounding the [`enum@Error`] struct as `E`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
