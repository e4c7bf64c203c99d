//! SSH message-type constants (RFC 4253/4254) and the handful of wire
//! primitives the inline dispatcher needs to parse transport-control
//! messages without pulling in a full message-struct crate.

pub const DISCONNECT: u8 = 1;
pub const IGNORE: u8 = 2;
pub const UNIMPLEMENTED: u8 = 3;
pub const DEBUG: u8 = 4;
pub const SERVICE_REQUEST: u8 = 5;
pub const SERVICE_ACCEPT: u8 = 6;
pub const KEXINIT: u8 = 20;
pub const NEWKEYS: u8 = 21;

pub const CHANNEL_WINDOW_ADJUST: u8 = 93;
pub const CHANNEL_DATA: u8 = 94;
pub const CHANNEL_EXTENDED_DATA: u8 = 95;
pub const CHANNEL_EOF: u8 = 96;
pub const CHANNEL_CLOSE: u8 = 97;

/// RFC 4253 §11.1 disconnect reason: bad MAC received.
pub const DISCONNECT_MAC_ERROR: u32 = 5;

/// Read a big-endian `u32` at `buf[offset..offset+4]`.
pub fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes(b.try_into().expect("slice of len 4")))
}

/// Read an SSH length-prefixed string (a `u32` length followed by that many
/// bytes) starting at `offset`. Returns the string bytes and the offset just
/// past them.
pub fn read_string(buf: &[u8], offset: usize) -> Option<(&[u8], usize)> {
    let len = read_u32(buf, offset)? as usize;
    let start = offset + 4;
    let bytes = buf.get(start..start + len)?;

    Some((bytes, start + len))
}

/// Append a `u32` length followed by `s`.
pub fn write_string(out: &mut Vec<u8>, s: &[u8]) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s);
}
