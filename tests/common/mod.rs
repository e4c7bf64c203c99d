use std::collections::HashMap;

use assh::channel::{ChannelTable, ExtendedDataMode};

#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelState {
    pub packet_size: u32,
    pub window_size: u32,
    pub extended_data_mode: Option<ExtendedDataMode>,
    pub eof: bool,
    pub closed: bool,
}

#[derive(Debug, Default)]
pub struct ChannelRegistry(pub HashMap<u32, ChannelState>);

impl ChannelTable for ChannelRegistry {
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
