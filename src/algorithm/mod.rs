//! Pluggable cipher, MAC and compression method descriptors: the crypto
//! pipeline's late-bound vtable equivalent.

mod cipher;
pub use cipher::{Builtin as CipherBuiltin, Cipher, CipherState, CustomCipher};

mod hmac;
pub use hmac::Hmac;

mod compress;
pub use compress::{Compress, Compressed, Decompressed};
