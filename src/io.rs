//! Wire I/O: reading exact byte counts and writing whole frames on a socket
//! that toggles between non-blocking (first byte of a frame) and blocking
//! (everything after) per RFC 4253's framing needs.

use std::io::{self, Read, Write};
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};

/// A bidirectional byte channel the engine can toggle in and out of
/// non-blocking mode. Implemented for [`std::net::TcpStream`] and any other
/// socket-like type that supports the same.
pub trait Pipe: Read + Write {
    /// Put the underlying descriptor in (or out of) non-blocking mode.
    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()>;
}

impl Pipe for std::net::TcpStream {
    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        std::net::TcpStream::set_nonblocking(self, nonblocking)
    }
}

impl Pipe for std::os::unix::net::UnixStream {
    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_nonblocking(self, nonblocking)
    }
}

/// Thin wrapper around a [`Pipe`] implementing the blocking/non-blocking read
/// dance the transport needs, plus whole-frame writes.
pub struct WireIo<P> {
    inner: P,
}

impl<P: Pipe> WireIo<P> {
    /// Wrap a socket-like type.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// Access the underlying socket.
    pub fn get_ref(&self) -> &P {
        &self.inner
    }

    /// Force-blocking read of exactly `buf.len()` bytes.
    ///
    /// Retries on interruption, spins with a short sleep on would-block up to
    /// `poll_max_loops` iterations, and turns a closed connection (a `0`-byte
    /// read) into a fatal I/O error rather than looping forever.
    pub fn read_exact(
        &mut self,
        buf: &mut [u8],
        poll_max_loops: u32,
        poll_udelay: Duration,
    ) -> Result<()> {
        self.inner.set_nonblocking(false)?;

        let mut filled = 0;
        let mut polls = 0;

        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    warn!("peer closed the connection mid-frame");
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "peer closed the connection mid-frame",
                    )));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    polls += 1;
                    if polls > poll_max_loops {
                        warn!(poll_max_loops, "gave up waiting for the peer");
                        return Err(Error::PollTimeout(poll_max_loops));
                    }
                    std::thread::sleep(poll_udelay);
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }

        Ok(())
    }

    /// Attempt a single-byte non-blocking read into `buf[0]`; if nothing is
    /// immediately available, returns `Ok(false)` ("no packet waiting") rather
    /// than an error. Once that first byte has arrived, commits to a blocking
    /// read of the remaining `buf.len() - 1` bytes.
    ///
    /// Inherited quirk: if the peer sends exactly one byte and then stalls
    /// indefinitely, this call blocks forever on the follow-on read — there is
    /// no bounded timeout on the "committed" portion, by design (see
    /// `DESIGN.md`, Open Question — short read on plaintext preamble).
    pub fn peek1_then_fill(
        &mut self,
        buf: &mut [u8],
        poll_max_loops: u32,
        poll_udelay: Duration,
    ) -> Result<bool> {
        self.inner.set_nonblocking(true)?;

        loop {
            match self.inner.read(&mut buf[..1]) {
                Ok(0) => {
                    warn!("peer closed the connection before a frame started");
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "peer closed the connection",
                    )));
                }
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) => return Err(Error::Io(e)),
            }
        }

        self.read_exact(&mut buf[1..], poll_max_loops, poll_udelay)?;

        Ok(true)
    }

    /// Write an entire frame (already assembled: header + payload + padding
    /// [+ MAC]) in one blocking call. A short write on the underlying socket
    /// is retried transparently by `write_all`; any residual error is fatal.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.inner.set_nonblocking(false)?;
        self.inner.write_all(frame)?;
        self.inner.flush()?;

        Ok(())
    }
}
