//! Transport abstraction consumed by the MQTT codec.
//!
//! The codec never owns a socket. Inbound framing pulls bytes through the
//! [`Read`] trait, implemented by whatever transport the application uses
//! (TCP, TLS, a UART bridge, or a test double).

#![allow(async_fn_in_trait)]
#![deny(unsafe_code)]

/// Application layer protocols.
pub mod application;

/// Re-exports of common traits
pub mod prelude {
    #[cfg(feature = "async")]
    pub use super::AsyncRead;
    pub use super::{Read, RecvFn};
}

/// A source of bytes from the network.
///
/// `Ok(0)` means nothing is available right now; it does not signal end of
/// stream. Detecting a closed connection is left to the transport.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<T: Read + ?Sized> Read for &mut T {
    type Error = T::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(buf)
    }
}

/// Asynchronous counterpart of [`Read`].
#[cfg(feature = "async")]
pub trait AsyncRead {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection asynchronously
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Error of a raw receive function, carrying its negative return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvError(pub i32);

#[cfg(feature = "defmt")]
impl defmt::Format for RecvError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "RecvError({=i32})", self.0)
    }
}

/// Adapter for a raw receive function.
///
/// The wrapped function reads up to `buf.len()` bytes and returns the number
/// read, or a negative value on failure. Any transport state the function
/// needs is captured by the closure.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::network::{Read, RecvError, RecvFn};
///
/// let data = [0x20u8, 0x02];
/// let mut pos = 0;
/// let mut recv = RecvFn(|buf: &mut [u8]| {
///     let n = buf.len().min(data.len() - pos);
///     buf[..n].copy_from_slice(&data[pos..pos + n]);
///     pos += n;
///     n as i32
/// });
///
/// let mut byte = [0u8; 1];
/// assert_eq!(recv.read(&mut byte), Ok(1));
/// assert_eq!(byte[0], 0x20);
///
/// let mut failing = RecvFn(|_: &mut [u8]| -1);
/// assert_eq!(failing.read(&mut byte), Err(RecvError(-1)));
/// ```
pub struct RecvFn<F>(pub F);

impl<F> core::fmt::Debug for RecvFn<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("RecvFn")
    }
}

impl<F> Read for RecvFn<F>
where
    F: FnMut(&mut [u8]) -> i32,
{
    type Error = RecvError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let received = (self.0)(buf);
        if received < 0 {
            return Err(RecvError(received));
        }
        // A function reporting more than it was asked for is broken.
        let received = received as usize;
        if received > buf.len() {
            return Err(RecvError(-1));
        }
        Ok(received)
    }
}
