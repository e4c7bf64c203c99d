use std::io::{Read, Write};

use strum::{AsRefStr, EnumString};

use crate::error::{Error, Result};

/// The compression algorithms, keyed off their RFC 4253 wire name.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Compress {
    /// zlib compression, as specified by RFC 4253.
    Zlib,

    /// No compression.
    #[default]
    None,
}

/// The outcome of a decompression pass, carrying the ownership distinction
/// the caller needs to decide whether it may reuse its receive buffer as-is.
#[derive(Debug)]
pub enum Decompressed<'b> {
    /// No compression was negotiated: the payload is untouched, still owned
    /// by the caller's original buffer.
    Reused(&'b [u8]),

    /// Compression was negotiated and the inflated bytes live in a freshly
    /// allocated buffer.
    Owned(Vec<u8>),
}

impl Decompressed<'_> {
    /// Borrow the decompressed bytes regardless of which variant this is.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Reused(b) => b,
            Self::Owned(b) => b,
        }
    }
}

/// The outcome of a compression pass.
#[derive(Debug)]
pub enum Compressed<'b> {
    /// No compression was negotiated: the payload is untouched.
    Reused(&'b [u8]),

    /// Compression was negotiated and the deflated bytes live in a freshly
    /// allocated buffer.
    Owned(Vec<u8>),

    /// Compression was negotiated but the caller's buffer wasn't large
    /// enough to deflate in place; the caller must retry with a bigger one.
    ///
    /// Unlike the two variants above this carries no data: it's a signal,
    /// not a result.
    CopyRequired,
}

impl Compressed<'_> {
    /// Borrow the compressed bytes, if any were produced.
    pub fn as_slice(&self) -> Option<&[u8]> {
        match self {
            Self::Reused(b) => Some(b),
            Self::Owned(b) => Some(b),
            Self::CopyRequired => None,
        }
    }
}

impl Compress {
    /// Inflate `input`, rejecting an output larger than `max_decompressed`.
    pub fn decompress<'b>(&self, input: &'b [u8], max_decompressed: u32) -> Result<Decompressed<'b>> {
        match self {
            Self::None => Ok(Decompressed::Reused(input)),
            Self::Zlib => {
                let mut decoder = libflate::zlib::Decoder::new(input).map_err(Error::Io)?;
                let mut out = Vec::new();

                decoder
                    .by_ref()
                    .take(u64::from(max_decompressed) + 1)
                    .read_to_end(&mut out)
                    .map_err(Error::Io)?;

                if out.len() > max_decompressed as usize {
                    return Err(Error::Proto("decompressed payload exceeds configured limit"));
                }

                Ok(Decompressed::Owned(out))
            }
        }
    }

    /// Deflate `input`. Returns [`Compressed::Reused`] when no compression is
    /// negotiated, otherwise a freshly allocated buffer.
    pub fn compress<'b>(&self, input: &'b [u8]) -> Result<Compressed<'b>> {
        match self {
            Self::None => Ok(Compressed::Reused(input)),
            Self::Zlib => {
                let mut encoder = libflate::zlib::Encoder::new(Vec::new()).map_err(Error::Io)?;
                encoder.write_all(input).map_err(Error::Io)?;

                Ok(Compressed::Owned(encoder.finish().into_result().map_err(Error::Io)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_round_trips() {
        let payload = b"the quick brown fox jumps over the lazy dog".repeat(4);

        let compressed = Compress::Zlib.compress(&payload).unwrap();
        let bytes = compressed.as_slice().unwrap();

        let decompressed = Compress::Zlib.decompress(bytes, 1 << 20).unwrap();
        assert_eq!(decompressed.as_slice(), payload.as_slice());
    }

    #[test]
    fn none_is_passthrough() {
        let payload = b"plaintext";

        let compressed = Compress::None.compress(payload).unwrap();
        assert_eq!(compressed.as_slice().unwrap(), payload);

        let decompressed = Compress::None.decompress(payload, 16).unwrap();
        assert_eq!(decompressed.as_slice(), payload);
    }

    #[test]
    fn decompression_bomb_is_rejected() {
        let payload = vec![0u8; 1 << 16];
        let compressed = Compress::Zlib.compress(&payload).unwrap();
        let bytes = compressed.as_slice().unwrap();

        let err = Compress::Zlib.decompress(bytes, 1024).unwrap_err();
        assert!(matches!(err, Error::Proto(_)));
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("zlib".parse::<Compress>(), Ok(Compress::Zlib));
        assert_eq!("none".parse::<Compress>(), Ok(Compress::None));
    }
}
