//! The packet brigade: a FIFO of already-decoded, accepted packets awaiting
//! dispatch to a caller via `ask`/`require`.
//!
//! The original engine this is modeled on keeps this queue as a doubly-linked
//! list of heap nodes so any entry can be unlinked in place; a [`VecDeque`]
//! gives the same arrival-order FIFO semantics with none of the unsafe
//! pointer-chasing, so that's what backs it here.

use std::collections::VecDeque;

use crate::packet::Packet;

/// The receive-side packet queue.
#[derive(Debug, Default)]
pub struct Brigade {
    packets: VecDeque<Packet>,
}

impl Brigade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly dispatched packet to the back of the queue.
    pub fn push(&mut self, packet: Packet) {
        self.packets.push_back(packet);
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Scan the queue in arrival order for the first entry whose message
    /// type is `message_type` and, if `match_bytes` is given, whose bytes at
    /// `match_offset` equal it. The match, if any, is removed and returned;
    /// non-matching entries are left untouched.
    pub fn ask(&mut self, message_type: u8, match_at: Option<(usize, &[u8])>) -> Option<Packet> {
        let index = self.packets.iter().position(|packet| {
            if packet.message_type() != message_type {
                return false;
            }

            match match_at {
                Some((offset, bytes)) => packet.bytes_at(offset, bytes.len()) == Some(bytes),
                None => true,
            }
        })?;

        self.packets.remove(index)
    }
}
