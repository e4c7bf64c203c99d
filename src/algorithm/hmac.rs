use strum::{AsRefStr, EnumString};

use crate::error::{Error, Result};

/// The Message Authentication Code algorithms, keyed off their RFC 4253 /
/// RFC 6668 wire name.
///
/// Encrypt-then-MAC variants are intentionally not represented: this engine's
/// MAC invariant always covers the sequence number and cleartext payload,
/// never the ciphertext, so an ETM negotiation can't be honored here.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Hmac {
    /// HMAC-SHA2-512.
    #[strum(serialize = "hmac-sha2-512")]
    HmacSha512,

    /// HMAC-SHA2-256.
    #[strum(serialize = "hmac-sha2-256")]
    HmacSha256,

    /// HMAC-SHA1.
    HmacSha1,

    /// HMAC-MD5.
    HmacMd5,

    /// No MAC algorithm.
    #[default]
    None,
}

impl Hmac {
    /// Size, in bytes, of the produced tag.
    pub fn size(&self) -> usize {
        match self {
            Self::HmacSha512 => 64,
            Self::HmacSha256 => 32,
            Self::HmacSha1 => 20,
            Self::HmacMd5 => 16,
            Self::None => 0,
        }
    }

    /// Key size, in bytes, this algorithm is keyed with.
    pub fn key_size(&self) -> usize {
        self.size()
    }

    fn sign_with<M: digest::Mac + digest::KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        use digest::Mac;

        let mut mac = M::new_from_slice(key).map_err(|_| Error::Decrypt)?;
        mac.update(data);

        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify_with<M: digest::Mac + digest::KeyInit>(key: &[u8], data: &[u8], tag: &[u8]) -> Result<()> {
        use digest::Mac;

        let mut mac = M::new_from_slice(key).map_err(|_| Error::Decrypt)?;
        mac.update(data);
        mac.verify_slice(tag).map_err(|_| Error::InvalidMac)
    }

    /// Compute the MAC tag for `data`, keyed by `key`.
    pub fn sign(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::HmacSha512 => Self::sign_with::<hmac::Hmac<sha2::Sha512>>(key, data),
            Self::HmacSha256 => Self::sign_with::<hmac::Hmac<sha2::Sha256>>(key, data),
            Self::HmacSha1 => Self::sign_with::<hmac::Hmac<sha1::Sha1>>(key, data),
            Self::HmacMd5 => Self::sign_with::<hmac::Hmac<md5::Md5>>(key, data),
            Self::None => Ok(Vec::new()),
        }
    }

    /// Verify `tag` against the MAC computed for `data`, keyed by `key`, in
    /// constant time.
    pub fn verify(&self, key: &[u8], data: &[u8], tag: &[u8]) -> Result<()> {
        match self {
            Self::HmacSha512 => Self::verify_with::<hmac::Hmac<sha2::Sha512>>(key, data, tag),
            Self::HmacSha256 => Self::verify_with::<hmac::Hmac<sha2::Sha256>>(key, data, tag),
            Self::HmacSha1 => Self::verify_with::<hmac::Hmac<sha1::Sha1>>(key, data, tag),
            Self::HmacMd5 => Self::verify_with::<hmac::Hmac<md5::Md5>>(key, data, tag),
            Self::None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_and_verifies() {
        let key = vec![0x42; Hmac::HmacSha256.key_size()];
        let data = b"sequence-number-and-payload";

        let tag = Hmac::HmacSha256.sign(&key, data).unwrap();
        assert_eq!(tag.len(), Hmac::HmacSha256.size());

        Hmac::HmacSha256.verify(&key, data, &tag).unwrap();
    }

    #[test]
    fn rejects_tampered_tag() {
        let key = vec![0x42; Hmac::HmacSha1.key_size()];
        let data = b"hello";

        let mut tag = Hmac::HmacSha1.sign(&key, data).unwrap();
        tag[0] ^= 0xff;

        assert!(matches!(
            Hmac::HmacSha1.verify(&key, data, &tag),
            Err(Error::InvalidMac)
        ));
    }

    #[test]
    fn none_hmac_produces_empty_tag() {
        let tag = Hmac::None.sign(&[], b"anything").unwrap();
        assert!(tag.is_empty());
        Hmac::None.verify(&[], b"anything", &[]).unwrap();
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("hmac-sha2-256".parse::<Hmac>(), Ok(Hmac::HmacSha256));
        assert_eq!("hmac-sha1".parse::<Hmac>(), Ok(Hmac::HmacSha1));
        assert!("hmac-sha2-256-etm@openssh.com".parse::<Hmac>().is_err());
    }
}
