//! The inline dispatcher: decides, for a freshly decoded [`Packet`], whether
//! it is handled on the spot (DISCONNECT, IGNORE, DEBUG, channel
//! flow-control) or queued to the brigade for the caller to retrieve later.

use tracing::{debug, warn};

use crate::callbacks::Callbacks;
use crate::channel::{ChannelTable, ExtendedDataMode};
use crate::error::{DisconnectedBy, DisconnectedError, Error, Result};
use crate::message::{self, read_string, read_u32};
use crate::packet::{MacStatus, Packet, CHANNEL_DATA_HEAD, CHANNEL_EXTENDED_DATA_HEAD};

/// What the caller (`Session::packet_read`) must do with a dispatched packet.
#[derive(Debug)]
pub enum Action {
    /// The packet was fully handled inline; nothing more to do.
    Consumed,

    /// Append the packet to the brigade.
    Enqueue(Packet),

    /// Append the packet to the brigade and additionally drive a key
    /// (re-)exchange before returning to the caller.
    EnqueueAndRekey(Packet),

    /// The peer asked to disconnect; the session is now dead.
    Disconnect(DisconnectedError),

    /// The packet was discarded, but a `WINDOW_ADJUST` for `bytes` must be
    /// sent back to the peer on `channel_id` to avoid starving it.
    SendWindowAdjust { channel_id: u32, bytes: u32 },
}

/// Resolve a possibly-invalid MAC status against the mac-error callback.
/// Returns `Ok(MacStatus::Confirmed)` if the frame should be treated as
/// trusted (either it already was, or the callback rescued it), or the
/// fatal [`Error::InvalidMac`] otherwise.
pub fn resolve_mac(status: MacStatus, callbacks: &mut Callbacks) -> Result<MacStatus> {
    match status {
        MacStatus::Invalid if !callbacks.mac_error_rescued() => Err(Error::InvalidMac),
        MacStatus::Invalid => Ok(MacStatus::Confirmed),
        confirmed => Ok(confirmed),
    }
}

/// Apply the inline dispatch table to an already MAC-confirmed packet.
///
/// The channel-level outcomes (`ChannelUnknown`, `ChannelPacketExceeded`,
/// `ChannelWindowExceeded`) are advisory: they never fail this call, they're
/// returned alongside the `Action` the caller should still take, for
/// `Session::last_warning()` to surface.
pub fn dispatch<C: ChannelTable>(
    packet: Packet,
    exchanging_keys: bool,
    channels: &mut C,
    callbacks: &mut Callbacks,
) -> (Action, Option<Error>) {
    match packet.message_type() {
        message::DISCONNECT => {
            let reason = read_u32(packet.data(), 1).unwrap_or(0);
            let (desc, next) = read_string(packet.data(), 5).unwrap_or((&[], 5));
            let (lang, _) = read_string(packet.data(), next).unwrap_or((&[], next));

            let err = DisconnectedError {
                by: DisconnectedBy::Them,
                reason,
                description: String::from_utf8_lossy(desc).into_owned(),
                language: String::from_utf8_lossy(lang).into_owned(),
            };

            debug!(reason = err.reason, description = %err.description, "<- DISCONNECT");
            callbacks.disconnected(&err);

            (Action::Disconnect(err), None)
        }

        message::IGNORE => {
            debug!("<- IGNORE");

            if let Some((data, _)) = read_string(packet.data(), 1) {
                callbacks.ignored(data);
            }

            (Action::Consumed, None)
        }

        message::DEBUG => {
            let always_display = packet.data().get(1).copied().unwrap_or(0) != 0;
            let (msg, next) = read_string(packet.data(), 2).unwrap_or((&[], 2));
            let (lang, _) = read_string(packet.data(), next).unwrap_or((&[], next));

            debug!(always_display, message = %String::from_utf8_lossy(msg), "<- DEBUG");
            callbacks.debugged(always_display, msg, lang);

            (Action::Consumed, None)
        }

        message::KEXINIT => {
            if exchanging_keys {
                debug!("<- KEXINIT while already exchanging keys, queuing");
                (Action::Enqueue(packet), None)
            } else {
                debug!("<- KEXINIT, triggering rekey");
                (Action::EnqueueAndRekey(packet), None)
            }
        }

        message::CHANNEL_DATA => dispatch_channel_data(packet, channels),
        message::CHANNEL_EXTENDED_DATA => dispatch_channel_extended_data(packet, channels),

        message::CHANNEL_EOF => {
            if let Some(id) = read_u32(packet.data(), 1) {
                debug!(channel = id, "<- CHANNEL_EOF");
                channels.set_eof(id);
            }

            (Action::Consumed, None)
        }

        message::CHANNEL_CLOSE => {
            if let Some(id) = read_u32(packet.data(), 1) {
                debug!(channel = id, "<- CHANNEL_CLOSE");
                channels.set_closed(id);
            }

            (Action::Consumed, None)
        }

        _ => (Action::Enqueue(packet), None),
    }
}

fn dispatch_channel_data<C: ChannelTable>(mut packet: Packet, channels: &mut C) -> (Action, Option<Error>) {
    let Some(id) = read_u32(packet.data(), 1) else {
        return (Action::Consumed, None);
    };

    let Some(packet_size) = channels.packet_size(id) else {
        warn!(channel = id, "<- CHANNEL_DATA for unknown channel");
        return (Action::Consumed, Some(Error::ChannelUnknown(id)));
    };
    let window = channels.window_size(id).unwrap_or(0);

    let Some((data, _)) = read_string(packet.data(), 1 + 4) else {
        return (Action::Consumed, None);
    };

    let (accepted, warning) = accept_within_limits(data.len() as u32, packet_size, window, id);
    channels.shrink_window(id, accepted);
    channels.clear_eof(id);

    if let Some(ref warning) = warning {
        warn!(channel = id, error = %warning, "<- CHANNEL_DATA truncated");
    }

    debug_assert_eq!(packet.data_head(), CHANNEL_DATA_HEAD);
    packet.truncate_body(accepted as usize);
    (Action::Enqueue(packet), warning)
}

fn dispatch_channel_extended_data<C: ChannelTable>(mut packet: Packet, channels: &mut C) -> (Action, Option<Error>) {
    let Some(id) = read_u32(packet.data(), 1) else {
        return (Action::Consumed, None);
    };

    if channels.extended_data_mode(id) == Some(ExtendedDataMode::Ignore) {
        let datalen = packet.data().len().saturating_sub(CHANNEL_EXTENDED_DATA_HEAD);

        debug!(channel = id, bytes = datalen, "<- CHANNEL_EXTENDED_DATA ignored, crediting window back");

        return (
            Action::SendWindowAdjust {
                channel_id: id,
                bytes: datalen as u32,
            },
            None,
        );
    }

    let Some(packet_size) = channels.packet_size(id) else {
        warn!(channel = id, "<- CHANNEL_EXTENDED_DATA for unknown channel");
        return (Action::Consumed, Some(Error::ChannelUnknown(id)));
    };
    let window = channels.window_size(id).unwrap_or(0);

    let Some((data, _)) = read_string(packet.data(), 1 + 4 + 4) else {
        return (Action::Consumed, None);
    };

    let (accepted, warning) = accept_within_limits(data.len() as u32, packet_size, window, id);
    channels.shrink_window(id, accepted);

    if let Some(ref warning) = warning {
        warn!(channel = id, error = %warning, "<- CHANNEL_EXTENDED_DATA truncated");
    }

    debug_assert_eq!(packet.data_head(), CHANNEL_EXTENDED_DATA_HEAD);
    packet.truncate_body(accepted as usize);
    (Action::Enqueue(packet), warning)
}

/// Clamp an incoming data length to the channel's advertised packet size and
/// remaining window, reporting whichever limit (if any) was hit first.
fn accept_within_limits(len: u32, packet_size: u32, window: u32, channel_id: u32) -> (u32, Option<Error>) {
    if len > packet_size {
        (packet_size.min(window), Some(Error::ChannelPacketExceeded(channel_id)))
    } else if len > window {
        (window, Some(Error::ChannelWindowExceeded(channel_id)))
    } else {
        (len, None)
    }
}
