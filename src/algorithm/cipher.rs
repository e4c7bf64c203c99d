use std::fmt;

use strum::{AsRefStr, EnumString};

use crate::error::{Error, Result};

/// Opaque per-direction cipher state, boxed as `Any` so a single enum variant
/// can hold whichever concrete RustCrypto cipher type it negotiated without
/// a generic parameter leaking onto [`Cipher`] itself.
pub type CipherState = Box<dyn std::any::Any + Send + Sync>;

/// A *custom* cipher transform: the escape hatch for an algorithm that isn't
/// one of the built-in streaming ciphers. Mirrors the C source's
/// session-pointer-taking `crypt()` function pointer — here, a trait object
/// that owns whatever state it needs and operates directly on a block.
pub trait CustomCipher: fmt::Debug + Send + Sync {
    /// The cipher's natural block size, in bytes.
    fn block_size(&self) -> usize;

    /// Encrypt `buffer` in place.
    fn encrypt(&mut self, buffer: &mut [u8]) -> Result<()>;

    /// Decrypt `buffer` in place.
    fn decrypt(&mut self, buffer: &mut [u8]) -> Result<()>;
}

/// The built-in streaming SSH cipher algorithms, keyed off their RFC 4253 /
/// RFC 4344 wire name.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Builtin {
    /// AES-256 in counter (CTR) mode.
    Aes256Ctr,

    /// AES-192 in counter (CTR) mode.
    Aes192Ctr,

    /// AES-128 in counter (CTR) mode.
    Aes128Ctr,

    /// AES-256 in cipher block chaining (CBC) mode.
    Aes256Cbc,

    /// AES-192 in cipher block chaining (CBC) mode.
    Aes192Cbc,

    /// AES-128 in cipher block chaining (CBC) mode.
    Aes128Cbc,

    /// TripleDES in cipher block chaining (CBC) mode.
    #[strum(serialize = "3des-cbc")]
    TDesCbc,

    /// No cipher algorithm: frames are sent in the clear.
    #[default]
    None,
}

impl Builtin {
    pub fn block_size(&self) -> usize {
        match self {
            Self::None | Self::TDesCbc => 8,
            Self::Aes128Cbc
            | Self::Aes192Cbc
            | Self::Aes256Cbc
            | Self::Aes128Ctr
            | Self::Aes192Ctr
            | Self::Aes256Ctr => 16,
        }
    }

    pub fn key_size(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Aes128Cbc | Self::Aes128Ctr => 16,
            Self::TDesCbc | Self::Aes192Cbc | Self::Aes192Ctr => 24,
            Self::Aes256Cbc | Self::Aes256Ctr => 32,
        }
    }

    pub fn iv_size(&self) -> usize {
        match self {
            Self::None => 0,
            Self::TDesCbc => 8,
            Self::Aes128Cbc
            | Self::Aes192Cbc
            | Self::Aes256Cbc
            | Self::Aes128Ctr
            | Self::Aes192Ctr
            | Self::Aes256Ctr => 16,
        }
    }

    /// This is a hack to solve deduplication of the enum variants and to
    /// store the cipher states inside a dynamically typed `Box<dyn Any>`.
    fn state<'s, T: cipher::KeyIvInit + Send + Sync + 'static>(
        state: &'s mut Option<CipherState>,
        key: &[u8],
        iv: &[u8],
    ) -> Result<&'s mut T> {
        if state.as_ref().map(|s| !s.is::<T>()).unwrap_or(false) {
            *state = None;
        }

        Ok(state
            .get_or_insert_with(|| Box::new(T::new_from_slices(key, iv).expect("key/iv sized by key_size()/iv_size()")))
            .downcast_mut()
            .expect("state freshly (re)initialized above to the matching concrete type"))
    }

    fn ctr<C: ctr::cipher::StreamCipher>(cipher: &mut C, buffer: &mut [u8]) -> Result<()> {
        cipher
            .try_apply_keystream(buffer)
            .map_err(|_| Error::Decrypt)
    }

    pub fn encrypt(
        &self,
        state: &mut Option<CipherState>,
        key: &[u8],
        iv: &[u8],
        buffer: &mut [u8],
    ) -> Result<()> {
        fn cbc<C: cbc::cipher::BlockEncryptMut>(cipher: &mut C, buffer: &mut [u8]) -> Result<()> {
            use cbc::cipher::inout;

            let data = inout::InOutBufReserved::from_mut_slice(buffer, buffer.len())
                .map_err(|_| Error::Decrypt)?;
            let mut buf = data
                .into_padded_blocks::<cbc::cipher::block_padding::NoPadding, C::BlockSize>()
                .map_err(|_| Error::Decrypt)?;

            cipher.encrypt_blocks_inout_mut(buf.get_blocks());
            if let Some(block) = buf.get_tail_block() {
                cipher.encrypt_block_inout_mut(block);
            }

            Ok(())
        }

        match self {
            Self::Aes256Ctr => Self::ctr(Self::state::<ctr::Ctr128BE<aes::Aes256>>(state, key, iv)?, buffer),
            Self::Aes192Ctr => Self::ctr(Self::state::<ctr::Ctr128BE<aes::Aes192>>(state, key, iv)?, buffer),
            Self::Aes128Ctr => Self::ctr(Self::state::<ctr::Ctr128BE<aes::Aes128>>(state, key, iv)?, buffer),
            Self::Aes256Cbc => cbc(Self::state::<cbc::Encryptor<aes::Aes256>>(state, key, iv)?, buffer),
            Self::Aes192Cbc => cbc(Self::state::<cbc::Encryptor<aes::Aes192>>(state, key, iv)?, buffer),
            Self::Aes128Cbc => cbc(Self::state::<cbc::Encryptor<aes::Aes128>>(state, key, iv)?, buffer),
            Self::TDesCbc => cbc(Self::state::<cbc::Encryptor<des::TdesEde3>>(state, key, iv)?, buffer),
            Self::None => Ok(()),
        }
    }

    pub fn decrypt(
        &self,
        state: &mut Option<CipherState>,
        key: &[u8],
        iv: &[u8],
        buffer: &mut [u8],
    ) -> Result<()> {
        fn cbc<C: cbc::cipher::BlockDecryptMut>(cipher: &mut C, buffer: &mut [u8]) -> Result<()> {
            use cbc::cipher::inout;

            let data = inout::InOutBufReserved::from_mut_slice(buffer, buffer.len())
                .map_err(|_| Error::Decrypt)?;
            let mut buf = data
                .into_padded_blocks::<cbc::cipher::block_padding::NoPadding, C::BlockSize>()
                .map_err(|_| Error::Decrypt)?;

            cipher.decrypt_blocks_inout_mut(buf.get_blocks());
            if let Some(block) = buf.get_tail_block() {
                cipher.decrypt_block_inout_mut(block);
            }

            Ok(())
        }

        match self {
            // In CTR mode, encryption and decryption are the same operation.
            Self::Aes256Ctr | Self::Aes192Ctr | Self::Aes128Ctr => self.encrypt(state, key, iv, buffer),
            Self::Aes256Cbc => cbc(Self::state::<cbc::Decryptor<aes::Aes256>>(state, key, iv)?, buffer),
            Self::Aes192Cbc => cbc(Self::state::<cbc::Decryptor<aes::Aes192>>(state, key, iv)?, buffer),
            Self::Aes128Cbc => cbc(Self::state::<cbc::Decryptor<aes::Aes128>>(state, key, iv)?, buffer),
            Self::TDesCbc => cbc(Self::state::<cbc::Decryptor<des::TdesEde3>>(state, key, iv)?, buffer),
            Self::None => Ok(()),
        }
    }
}

/// A cipher method descriptor: either a built-in streaming cipher, or a
/// pluggable custom transform.
#[derive(Debug, Default)]
pub enum Cipher {
    /// One of the built-in streaming ciphers.
    #[default]
    Builtin(Builtin),

    /// A pluggable custom transform, handed the whole block directly.
    Custom(Box<dyn CustomCipher>),
}

impl Cipher {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::Builtin(Builtin::None))
    }

    pub fn block_size(&self) -> usize {
        match self {
            Self::Builtin(b) => b.block_size(),
            Self::Custom(c) => c.block_size(),
        }
    }

    pub fn key_size(&self) -> usize {
        match self {
            Self::Builtin(b) => b.key_size(),
            Self::Custom(_) => 0,
        }
    }

    pub fn iv_size(&self) -> usize {
        match self {
            Self::Builtin(b) => b.iv_size(),
            Self::Custom(_) => 0,
        }
    }

    pub fn encrypt(
        &mut self,
        state: &mut Option<CipherState>,
        key: &[u8],
        iv: &[u8],
        buffer: &mut [u8],
    ) -> Result<()> {
        match self {
            Self::Builtin(b) => b.encrypt(state, key, iv, buffer),
            Self::Custom(c) => c.encrypt(buffer),
        }
    }

    pub fn decrypt(
        &mut self,
        state: &mut Option<CipherState>,
        key: &[u8],
        iv: &[u8],
        buffer: &mut [u8],
    ) -> Result<()> {
        match self {
            Self::Builtin(b) => b.decrypt(state, key, iv, buffer),
            Self::Custom(c) => c.decrypt(buffer),
        }
    }
}

impl From<Builtin> for Cipher {
    fn from(builtin: Builtin) -> Self {
        Self::Builtin(builtin)
    }
}

impl std::str::FromStr for Cipher {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Builtin::from_str(s).map(Cipher::Builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ctr_cipher() {
        let mut cipher = Cipher::Builtin(Builtin::Aes128Ctr);
        let key = vec![0u8; cipher.key_size()];
        let iv = vec![0u8; cipher.iv_size()];

        let mut state = None;
        let mut buf = b"0123456789abcdef".to_vec();
        let plain = buf.clone();

        cipher.encrypt(&mut state, &key, &iv, &mut buf).unwrap();
        assert_ne!(buf, plain);

        let mut state = None;
        cipher.decrypt(&mut state, &key, &iv, &mut buf).unwrap();
        assert_eq!(buf, plain);
    }

    #[test]
    fn round_trips_cbc_cipher() {
        let mut buf = b"0123456789abcdef".to_vec();
        let plain = buf.clone();

        let key = vec![0u8; Builtin::Aes256Cbc.key_size()];
        let iv = vec![0u8; Builtin::Aes256Cbc.iv_size()];

        let mut enc_state = None;
        Builtin::Aes256Cbc
            .encrypt(&mut enc_state, &key, &iv, &mut buf)
            .unwrap();
        assert_ne!(buf, plain);

        let mut dec_state = None;
        Builtin::Aes256Cbc
            .decrypt(&mut dec_state, &key, &iv, &mut buf)
            .unwrap();
        assert_eq!(buf, plain);
    }

    #[test]
    fn none_cipher_is_identity() {
        let mut cipher = Cipher::Builtin(Builtin::None);
        let mut buf = b"unencrypted".to_vec();
        let plain = buf.clone();

        let mut state = None;
        cipher.encrypt(&mut state, &[], &[], &mut buf).unwrap();
        assert_eq!(buf, plain);
        assert!(cipher.is_none());
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("aes128-ctr".parse::<Builtin>(), Ok(Builtin::Aes128Ctr));
        assert_eq!("3des-cbc".parse::<Builtin>(), Ok(Builtin::TDesCbc));
        assert!("unknown-cipher".parse::<Builtin>().is_err());
    }
}
