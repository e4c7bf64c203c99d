//! The narrow collaborator capability the dispatcher needs to apply
//! flow-control bookkeeping to channel data — channel ownership, creation and
//! teardown live entirely outside this crate.

/// How a channel wants extended data (stderr-like streams) handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedDataMode {
    /// Deliver extended data packets like ordinary channel data.
    Normal,

    /// Drop extended data packets, but keep the remote window topped up so
    /// the peer isn't starved waiting for an acknowledgement that will never
    /// come.
    Ignore,
}

/// A read/mutate capability over the channels a caller already knows about,
/// indexed by the *remote* channel id carried on the wire.
///
/// The engine never creates, owns or destroys a channel: it only looks one
/// up by id and adjusts the bookkeeping fields RFC 4254 flow control cares
/// about.
pub trait ChannelTable {
    /// The maximum single-packet size the channel advertised it can accept.
    fn packet_size(&self, remote_id: u32) -> Option<u32>;

    /// The remaining receive window, in bytes.
    fn window_size(&self, remote_id: u32) -> Option<u32>;

    /// How the channel wants extended data handled.
    fn extended_data_mode(&self, remote_id: u32) -> Option<ExtendedDataMode>;

    /// Reduce the receive window by `by` bytes, saturating at zero.
    fn shrink_window(&mut self, remote_id: u32, by: u32);

    /// Mark the channel's remote side as having reached EOF.
    fn set_eof(&mut self, remote_id: u32);

    /// Clear a previously set EOF flag. Arriving `CHANNEL_DATA` resets it,
    /// since a peer that sent EOF and then more data simply un-did it.
    fn clear_eof(&mut self, remote_id: u32);

    /// Mark the channel's remote side as closed.
    fn set_closed(&mut self, remote_id: u32);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Default, Clone, Copy)]
    pub struct ChannelState {
        pub packet_size: u32,
        pub window_size: u32,
        pub extended_data_mode: Option<ExtendedDataMode>,
        pub eof: bool,
        pub closed: bool,
    }

    #[derive(Debug, Default)]
    pub struct FakeChannelTable(pub HashMap<u32, ChannelState>);

    impl ChannelTable for FakeChannelTable {
        fn packet_size(&self, remote_id: u32) -> Option<u32> {
            self.0.get(&remote_id).map(|c| c.packet_size)
        }

        fn window_size(&self, remote_id: u32) -> Option<u32> {
            self.0.get(&remote_id).map(|c| c.window_size)
        }

        fn extended_data_mode(&self, remote_id: u32) -> Option<ExtendedDataMode> {
            self.0.get(&remote_id).and_then(|c| c.extended_data_mode)
        }

        fn shrink_window(&mut self, remote_id: u32, by: u32) {
            if let Some(c) = self.0.get_mut(&remote_id) {
                c.window_size = c.window_size.saturating_sub(by);
            }
        }

        fn set_eof(&mut self, remote_id: u32) {
            if let Some(c) = self.0.get_mut(&remote_id) {
                c.eof = true;
            }
        }

        fn clear_eof(&mut self, remote_id: u32) {
            if let Some(c) = self.0.get_mut(&remote_id) {
                c.eof = false;
            }
        }

        fn set_closed(&mut self, remote_id: u32) {
            if let Some(c) = self.0.get_mut(&remote_id) {
                c.closed = true;
            }
        }
    }
}
