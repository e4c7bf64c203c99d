//! Tunables for the packet engine.

use std::time::Duration;

/// Tunable limits and timing parameters for a [`crate::session::Session`].
///
/// Constructed via [`Default`], individual fields may be overridden before
/// the session is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of would-block retries `read_exact` performs before
    /// giving up on a blocking read.
    pub poll_max_loops: u32,

    /// Delay slept between would-block retries.
    pub poll_udelay: Duration,

    /// Maximum accepted decoded payload size, in bytes.
    pub max_payload: u32,

    /// Maximum accepted decompressed payload size, in bytes.
    pub max_decompressed: u32,

    /// Maximum accepted compressed payload size, in bytes.
    pub max_compressed: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_max_loops: 5_000,
            poll_udelay: Duration::from_micros(250),
            max_payload: 40_000,
            max_decompressed: 40_000,
            max_compressed: 400_000,
        }
    }
}
