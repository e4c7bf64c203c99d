//! Byte-level frame codec: turning a decrypted, authenticated cipher block
//! stream into payload bytes on receive, and the inverse on send.
//!
//! `NEWKEYS` is not special-cased here: an [`Endpoint`] defaulted to the
//! `none` cipher and `none` MAC already presents an 8-byte block with no MAC,
//! which is exactly the pre-key-exchange framing rule.

use std::time::Duration;

use rand::RngCore;
use tracing::{trace, warn};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::io::{Pipe, WireIo};
use crate::packet::{MacStatus, Packet};

/// Minimum packet length per RFC 4253 §6, excluding the MAC.
const MIN_PACKET_LEN: usize = 16;

/// Decode one frame off the wire.
///
/// If `nonblocking` is set and no byte of the next frame has arrived yet,
/// returns `Ok(None)` rather than blocking.
pub fn recv<P: Pipe>(
    io: &mut WireIo<P>,
    endpoint: &mut Endpoint,
    nonblocking: bool,
    max_payload: u32,
    max_decompressed: u32,
    max_compressed: u32,
    poll_max_loops: u32,
    poll_udelay: Duration,
) -> Result<Option<Packet>> {
    let block = endpoint.block_size();
    let mac_size = endpoint.mac_size();

    let mut first = vec![0u8; block];

    if nonblocking {
        if !io.peek1_then_fill(&mut first, poll_max_loops, poll_udelay)? {
            return Ok(None);
        }
    } else {
        io.read_exact(&mut first, poll_max_loops, poll_udelay)?;
    }

    endpoint.decrypt(&mut first)?;

    let packet_length = u32::from_be_bytes(first[0..4].try_into().expect("4 bytes")) as usize;
    let padding_length = first[4] as usize;

    let frame_len = 4 + packet_length;

    if frame_len % block != 0 {
        warn!(frame_len, block, "frame length is not block-aligned");
        return Err(Error::Proto("frame length is not a multiple of the block size"));
    }
    if frame_len < MIN_PACKET_LEN.max(block) {
        warn!(frame_len, "frame shorter than the minimum packet length");
        return Err(Error::Proto("frame shorter than the minimum packet length"));
    }
    if padding_length < 4 {
        warn!(padding_length, "padding shorter than the minimum of 4 bytes");
        return Err(Error::Proto("padding shorter than the minimum of 4 bytes"));
    }

    let payload_len = packet_length
        .checked_sub(1 + padding_length)
        .ok_or(Error::Proto("padding length exceeds packet length"))?;

    let wire_limit = if endpoint.compress == crate::algorithm::Compress::None {
        max_payload
    } else {
        max_compressed
    };

    if payload_len as u32 > wire_limit {
        warn!(payload_len, wire_limit, "payload exceeds the configured maximum size");
        return Err(Error::Proto("payload exceeds the configured maximum size"));
    }

    let mut decrypted = first;
    if frame_len > block {
        let mut rest = vec![0u8; frame_len - block];
        io.read_exact(&mut rest, poll_max_loops, poll_udelay)?;
        endpoint.decrypt(&mut rest)?;
        decrypted.extend_from_slice(&rest);
    }

    let seq = endpoint.seqno();

    let mac_status = if mac_size == 0 {
        MacStatus::Confirmed
    } else {
        let mut mac = vec![0u8; mac_size];
        io.read_exact(&mut mac, poll_max_loops, poll_udelay)?;

        match endpoint.verify_mac(seq, &decrypted, &mac) {
            Ok(()) => MacStatus::Confirmed,
            Err(Error::InvalidMac) => {
                warn!(seq, "mac mismatch on received frame");
                MacStatus::Invalid
            }
            Err(e) => return Err(e),
        }
    };

    endpoint.advance_seqno();

    let payload_start = 5;
    let payload = &decrypted[payload_start..payload_start + payload_len];

    let decompressed = endpoint.compress.decompress(payload, max_decompressed)?;

    trace!(seq, message_type = decompressed.as_slice().first().copied().unwrap_or(0), len = decompressed.as_slice().len(), "<~-");

    Ok(Some(Packet::new(decompressed.as_slice().to_vec(), mac_status)))
}

/// Encode and write one frame.
pub fn send<P: Pipe>(io: &mut WireIo<P>, endpoint: &mut Endpoint, payload: &[u8]) -> Result<()> {
    let compressed = endpoint.compress.compress(payload)?;
    let payload = match compressed.as_slice() {
        Some(bytes) => bytes,
        None => return Err(Error::Proto("compressed payload did not fit, caller must retry")),
    };

    let padding_length = endpoint.padding_len(payload.len());
    let packet_length = (1 + payload.len() + padding_length as usize) as u32;

    let mut frame = Vec::with_capacity(4 + packet_length as usize);
    frame.extend_from_slice(&packet_length.to_be_bytes());
    frame.push(padding_length);
    frame.extend_from_slice(payload);

    let mut padding = vec![0u8; padding_length as usize];
    rand::thread_rng().fill_bytes(&mut padding);
    frame.extend_from_slice(&padding);

    let seq = endpoint.seqno();
    let mac = endpoint.sign_mac(seq, &frame)?;

    trace!(seq, message_type = payload.first().copied().unwrap_or(0), len = payload.len(), "-~>");

    endpoint.encrypt(&mut frame)?;
    endpoint.advance_seqno();

    frame.extend_from_slice(&mac);

    io.write_frame(&frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{Compress, Hmac};
    use std::io::{self, Cursor, Read, Write};

    struct MemPipe(Cursor<Vec<u8>>);

    impl Read for MemPipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Write for MemPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.0.flush()
        }
    }

    impl Pipe for MemPipe {
        fn set_nonblocking(&self, _nonblocking: bool) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn plaintext_round_trips_through_a_pipe() {
        let mut tx = Endpoint::default();
        let mut io = WireIo::new(MemPipe(Cursor::new(Vec::new())));

        send(&mut io, &mut tx, b"\x02hello ignore payload").unwrap();

        let written = io.get_ref().0.get_ref().clone();
        let mut read_io = WireIo::new(MemPipe(Cursor::new(written)));
        let mut rx = Endpoint::default();

        let packet = recv(
            &mut read_io,
            &mut rx,
            false,
            40_000,
            40_000,
            400_000,
            10,
            Duration::from_micros(1),
        )
        .unwrap()
        .unwrap();

        assert_eq!(packet.data(), b"\x02hello ignore payload");
        assert_eq!(packet.mac_status(), MacStatus::Confirmed);
        assert_eq!(rx.seqno(), 1);
    }

    #[test]
    fn seqno_advances_regardless_of_mac_outcome() {
        let mut tx = Endpoint::default();
        tx.rekey(
            crate::algorithm::Cipher::default(),
            Hmac::HmacSha1,
            Compress::None,
            crate::keys::Keys::new(vec![], vec![], vec![0x11; 20]),
        );

        let mut io = WireIo::new(MemPipe(Cursor::new(Vec::new())));
        send(&mut io, &mut tx, b"\x02hi").unwrap();

        let mut written = io.get_ref().0.get_ref().clone();
        // Flip a bit in the MAC trailer to force a mismatch.
        let last = written.len() - 1;
        written[last] ^= 0xff;

        let mut read_io = WireIo::new(MemPipe(Cursor::new(written)));
        let mut rx = Endpoint::default();
        rx.rekey(
            crate::algorithm::Cipher::default(),
            Hmac::HmacSha1,
            Compress::None,
            crate::keys::Keys::new(vec![], vec![], vec![0x11; 20]),
        );

        let packet = recv(&mut read_io, &mut rx, false, 40_000, 40_000, 400_000, 10, Duration::from_micros(1))
            .unwrap()
            .unwrap();

        assert_eq!(packet.mac_status(), MacStatus::Invalid);
        assert_eq!(rx.seqno(), 1);
    }

    #[test]
    fn compressed_wire_payload_past_max_compressed_is_rejected() {
        let mut tx = Endpoint::default();
        tx.rekey(
            crate::algorithm::Cipher::default(),
            Hmac::None,
            Compress::Zlib,
            crate::keys::Keys::new(vec![], vec![], vec![]),
        );

        let mut io = WireIo::new(MemPipe(Cursor::new(Vec::new())));
        let payload = b"the quick brown fox jumps over the lazy dog".repeat(20);
        send(&mut io, &mut tx, &payload).unwrap();

        let written = io.get_ref().0.get_ref().clone();
        let mut read_io = WireIo::new(MemPipe(Cursor::new(written)));
        let mut rx = Endpoint::default();
        rx.rekey(
            crate::algorithm::Cipher::default(),
            Hmac::None,
            Compress::Zlib,
            crate::keys::Keys::new(vec![], vec![], vec![]),
        );

        // A tiny max_compressed rejects the wire-level (still compressed)
        // payload before decompression is ever attempted, independent of
        // max_payload/max_decompressed which bound the inflated size.
        let err = recv(&mut read_io, &mut rx, false, 40_000, 40_000, 8, Duration::from_micros(1)).unwrap_err();
        assert!(matches!(err, Error::Proto(_)));
    }

    #[test]
    fn nonblocking_recv_with_nothing_waiting_returns_none() {
        struct WouldBlockOnceThen(Vec<u8>, bool);

        impl Read for WouldBlockOnceThen {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.1 {
                    self.1 = true;
                    return Err(io::Error::new(io::ErrorKind::WouldBlock, "no data yet"));
                }
                Cursor::new(&self.0).read(buf)
            }
        }

        impl Write for WouldBlockOnceThen {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        impl Pipe for WouldBlockOnceThen {
            fn set_nonblocking(&self, _nonblocking: bool) -> io::Result<()> {
                Ok(())
            }
        }

        let mut io = WireIo::new(WouldBlockOnceThen(Vec::new(), false));
        let mut rx = Endpoint::default();

        let packet = recv(&mut io, &mut rx, true, 40_000, 40_000, 400_000, 1, Duration::from_micros(1)).unwrap();
        assert!(packet.is_none());
    }
}
