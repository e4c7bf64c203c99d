//! Per-direction transport state: the active cipher, MAC and compression
//! methods, their key material, and the monotonically increasing sequence
//! counter.

use secrecy::ExposeSecret;

use crate::algorithm::{Cipher, CipherState, Compress, Hmac};
use crate::error::Result;
use crate::keys::Keys;

/// One direction's worth of transport state (either `local` or `remote`, in
/// the sense of send vs. receive).
#[derive(Debug, Default)]
pub struct Endpoint {
    pub cipher: Cipher,
    pub hmac: Hmac,
    pub compress: Compress,

    state: Option<CipherState>,
    keys: Keys,
    seqno: u32,
}

/// Minimum size of a binary packet frame, absent the MAC, per RFC 4253 §6.
const MIN_PACKET_SIZE: usize = 16;

/// The effective block size used for alignment before `NEWKEYS`.
const PLAINTEXT_BLOCK_SIZE: usize = 8;

const MIN_PADDING: usize = 4;

impl Endpoint {
    /// The cipher's block size, or the plaintext alignment of 8 bytes if no
    /// cipher is active.
    pub fn block_size(&self) -> usize {
        if self.cipher.is_none() {
            PLAINTEXT_BLOCK_SIZE
        } else {
            self.cipher.block_size()
        }
    }

    pub fn mac_size(&self) -> usize {
        self.hmac.size()
    }

    /// The sequence number of the *next* frame, without consuming it.
    pub fn seqno(&self) -> u32 {
        self.seqno
    }

    /// Advance the sequence counter by one frame, wrapping modulo 2^32.
    pub fn advance_seqno(&mut self) {
        self.seqno = self.seqno.wrapping_add(1);
    }

    /// Install freshly negotiated algorithms and key material, replacing
    /// whatever was active. Called once per `NEWKEYS`.
    pub fn rekey(&mut self, cipher: Cipher, hmac: Hmac, compress: Compress, keys: Keys) {
        self.cipher = cipher;
        self.hmac = hmac;
        self.compress = compress;
        self.keys = keys;
        self.state = None;
    }

    pub fn decrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.cipher.is_none() {
            return Ok(());
        }

        self.cipher.decrypt(
            &mut self.state,
            self.keys.key.expose_secret(),
            self.keys.iv.expose_secret(),
            buf,
        )
    }

    pub fn encrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.cipher.is_none() {
            return Ok(());
        }

        self.cipher.encrypt(
            &mut self.state,
            self.keys.key.expose_secret(),
            self.keys.iv.expose_secret(),
            buf,
        )
    }

    /// Verify a received MAC tag, in constant time, against the sequence
    /// number and frame bytes given.
    pub fn verify_mac(&self, seq: u32, data: &[u8], tag: &[u8]) -> Result<()> {
        if self.hmac.size() == 0 {
            return Ok(());
        }

        self.hmac
            .verify(self.keys.hmac.expose_secret(), &mac_data(seq, data), tag)
    }

    /// Compute the MAC tag for a frame about to be sent.
    pub fn sign_mac(&self, seq: u32, data: &[u8]) -> Result<Vec<u8>> {
        if self.hmac.size() == 0 {
            return Ok(Vec::new());
        }

        self.hmac.sign(self.keys.hmac.expose_secret(), &mac_data(seq, data))
    }

    /// The padding length (always >= 4) needed so the length-prefixed frame
    /// aligns to this endpoint's block size.
    pub fn padding_len(&self, payload_len: usize) -> u8 {
        let align = self.block_size();

        // size of length(4) + padding-length(1) + payload, before padding.
        let size = 4 + 1 + payload_len;
        let mut padding = align - (size % align);

        if padding < MIN_PADDING {
            padding += align;
        }

        if size + padding < MIN_PACKET_SIZE.max(align) {
            padding += align;
        }

        padding as u8
    }
}

/// Concatenate the sequence number and frame bytes the MAC is computed over.
fn mac_data(seq: u32, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + data.len());
    buf.extend_from_slice(&seq.to_be_bytes());
    buf.extend_from_slice(data);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::CipherBuiltin;

    #[test]
    fn seqno_wraps_modulo_2_32() {
        let mut ep = Endpoint::default();
        ep.seqno = u32::MAX;
        ep.advance_seqno();
        assert_eq!(ep.seqno(), 0);
    }

    #[test]
    fn plaintext_padding_is_block_aligned_to_eight() {
        let ep = Endpoint::default();
        let padding = ep.padding_len(10);

        assert!(padding >= 4);
        assert_eq!((4 + 1 + 10 + padding as usize) % 8, 0);
    }

    #[test]
    fn decrypt_with_no_cipher_is_identity() {
        let mut ep = Endpoint::default();
        let mut buf = b"hello".to_vec();
        ep.decrypt(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn rekey_resets_cipher_state() {
        let mut ep = Endpoint::default();
        ep.rekey(
            Cipher::Builtin(CipherBuiltin::Aes128Ctr),
            Hmac::HmacSha1,
            Compress::None,
            Keys::new(vec![0; 16], vec![0; 16], vec![0; 20]),
        );

        assert_eq!(ep.block_size(), 16);
        assert_eq!(ep.mac_size(), 20);
    }
}
