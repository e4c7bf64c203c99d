//! The process-wide transport context: wraps a socket, the two per-direction
//! [`Endpoint`]s, the brigade, callbacks and config into the engine's single
//! entry point.

use tracing::{debug, warn};

use crate::algorithm::{Cipher, Compress, Hmac};
use crate::brigade::Brigade;
use crate::callbacks::Callbacks;
use crate::channel::ChannelTable;
use crate::config::Config;
use crate::dispatch::{self, Action};
use crate::endpoint::Endpoint;
use crate::error::{DisconnectedBy, DisconnectedError, Error, Result};
use crate::frame;
use crate::io::{Pipe, WireIo};
use crate::kex::KexExchange;
use crate::keys::Keys;
use crate::message;
use crate::packet::Packet;

/// Outcome of a single [`Session::packet_read`] call.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Non-blocking read with nothing available yet.
    NoPacket,

    /// A frame of this message type was processed (whether handled inline
    /// or appended to the brigade).
    Processed(u8),
}

/// The transport-layer packet engine.
pub struct Session<P> {
    socket: WireIo<P>,
    tx: Endpoint,
    rx: Endpoint,
    exchanging_keys: bool,
    packets: Brigade,
    callbacks: Callbacks,
    config: Config,
    last_warning: Option<Error>,
    disconnected: Option<DisconnectedError>,
}

impl<P: Pipe> Session<P> {
    /// Wrap a freshly connected socket. Both directions start out with the
    /// `none` cipher, `none` MAC and no compression, as required before the
    /// first `NEWKEYS`.
    pub fn new(socket: P, config: Config, callbacks: Callbacks) -> Self {
        Self {
            socket: WireIo::new(socket),
            tx: Endpoint::default(),
            rx: Endpoint::default(),
            exchanging_keys: false,
            packets: Brigade::new(),
            callbacks,
            config,
            last_warning: None,
            disconnected: None,
        }
    }

    /// The last advisory (non-fatal) warning recorded by the dispatcher,
    /// e.g. a `ChannelUnknown` for a stale channel id.
    pub fn last_warning(&self) -> Option<&Error> {
        self.last_warning.as_ref()
    }

    /// Whether the session has transitioned to `Disconnected`, either
    /// because the peer sent `DISCONNECT` or a fatal protocol/I/O error
    /// occurred.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.is_some()
    }

    /// Install freshly negotiated algorithms and key material on the send
    /// direction.
    pub fn rekey_tx(&mut self, cipher: Cipher, hmac: Hmac, compress: Compress, keys: Keys) {
        self.tx.rekey(cipher, hmac, compress, keys);
    }

    /// Install freshly negotiated algorithms and key material on the receive
    /// direction.
    pub fn rekey_rx(&mut self, cipher: Cipher, hmac: Hmac, compress: Compress, keys: Keys) {
        self.rx.rekey(cipher, hmac, compress, keys);
    }

    /// Whether a key re-exchange is presently under way.
    pub fn exchanging_keys(&self) -> bool {
        self.exchanging_keys
    }

    /// Set the re-exchange reentrancy guard. A [`KexExchange`] implementation
    /// should set this before driving the exchange and clear it on return.
    pub fn set_exchanging_keys(&mut self, exchanging: bool) {
        self.exchanging_keys = exchanging;
    }

    fn fail(&mut self, err: Error) -> Error {
        if err.is_fatal() {
            warn!(error = %err, "fatal transport error, disconnecting");
            self.disconnected.get_or_insert(DisconnectedError {
                by: DisconnectedBy::Us,
                reason: 0,
                description: err.to_string(),
                language: String::new(),
            });
        }

        err
    }

    fn check_disconnected(&self) -> Result<()> {
        if let Some(err) = &self.disconnected {
            return Err(Error::Disconnected(err.clone()));
        }

        Ok(())
    }

    /// Read and dispatch exactly one frame.
    ///
    /// If `block` is `false` and no frame has started arriving yet, returns
    /// `Ok(ReadOutcome::NoPacket)` rather than blocking. `KEXINIT` triggers a
    /// synchronous, reentrant call into `kex` before this returns.
    pub fn packet_read<C: ChannelTable>(
        &mut self,
        block: bool,
        channels: &mut C,
        kex: &mut impl KexExchange<P>,
    ) -> Result<ReadOutcome> {
        self.check_disconnected()?;

        let packet = frame::recv(
            &mut self.socket,
            &mut self.rx,
            !block,
            self.config.max_payload,
            self.config.max_decompressed,
            self.config.max_compressed,
            self.config.poll_max_loops,
            self.config.poll_udelay,
        );

        let packet = match packet {
            Ok(Some(packet)) => packet,
            Ok(None) => return Ok(ReadOutcome::NoPacket),
            Err(e) => return Err(self.fail(e)),
        };

        let status = match dispatch::resolve_mac(packet.mac_status(), &mut self.callbacks) {
            Ok(status) => status,
            Err(e) => {
                let _ = self.packet_write(&disconnect_payload(message::DISCONNECT_MAC_ERROR, b"invalid mac"));
                return Err(self.fail(e));
            }
        };

        let message_type = packet.message_type();
        let packet = Packet::new(packet.into_data(), status);

        let (action, warning) = dispatch::dispatch(packet, self.exchanging_keys, channels, &mut self.callbacks);
        if let Some(warning) = warning {
            warn!(error = %warning, "advisory channel warning");
            self.last_warning = Some(warning);
        }

        match action {
            Action::Consumed => Ok(ReadOutcome::Processed(message_type)),

            Action::Enqueue(packet) => {
                self.packets.push(packet);
                Ok(ReadOutcome::Processed(message_type))
            }

            Action::EnqueueAndRekey(packet) => {
                self.packets.push(packet);
                debug!("rekey triggered by incoming KEXINIT");
                kex.exchange(self, true)?;
                Ok(ReadOutcome::Processed(message_type))
            }

            Action::Disconnect(err) => {
                debug!(reason = err.reason, "peer disconnected");
                self.disconnected = Some(err.clone());
                Err(Error::Disconnected(err))
            }

            Action::SendWindowAdjust { channel_id, bytes } => {
                let mut payload = vec![message::CHANNEL_WINDOW_ADJUST];
                payload.extend_from_slice(&channel_id.to_be_bytes());
                payload.extend_from_slice(&bytes.to_be_bytes());

                self.packet_write(&payload)?;
                Ok(ReadOutcome::Processed(message_type))
            }
        }
    }

    /// Encode, authenticate, encrypt (as applicable) and write one frame.
    pub fn packet_write(&mut self, payload: &[u8]) -> Result<()> {
        self.check_disconnected()?;

        frame::send(&mut self.socket, &mut self.tx, payload).map_err(|e| self.fail(e))
    }

    /// Brigade lookup: the first queued packet whose type matches,
    /// optionally constrained to matching bytes at an offset.
    ///
    /// If `poll` is set, first drives one non-blocking [`Self::packet_read`]
    /// cycle (so a frame already sitting on the socket gets a chance to land
    /// in the brigade) before scanning; otherwise this is a pure brigade scan.
    pub fn ask<C: ChannelTable>(
        &mut self,
        message_type: u8,
        match_at: Option<(usize, &[u8])>,
        poll: bool,
        channels: &mut C,
        kex: &mut impl KexExchange<P>,
    ) -> Result<Option<Packet>> {
        if poll {
            self.packet_read(false, channels, kex)?;
        }

        Ok(self.packets.ask(message_type, match_at))
    }

    /// Block (driving reads) until a packet of `message_type` is available,
    /// or the session disconnects.
    pub fn require<C: ChannelTable>(
        &mut self,
        message_type: u8,
        match_at: Option<(usize, &[u8])>,
        channels: &mut C,
        kex: &mut impl KexExchange<P>,
    ) -> Result<Packet> {
        if let Some(packet) = self.packets.ask(message_type, match_at) {
            return Ok(packet);
        }

        loop {
            self.packet_read(true, channels, kex)?;

            if let Some(packet) = self.packets.ask(message_type, match_at) {
                return Ok(packet);
            }
        }
    }
}

fn disconnect_payload(reason: u32, description: &[u8]) -> Vec<u8> {
    let mut payload = vec![message::DISCONNECT];
    payload.extend_from_slice(&reason.to_be_bytes());
    message::write_string(&mut payload, description);
    message::write_string(&mut payload, b"");
    payload
}
