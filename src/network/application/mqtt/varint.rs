//! Remaining Length variable-length integer codec.
//!
//! The remaining length field is a variable-length encoding scheme used in MQTT
//! to specify the number of bytes following the fixed header. Each byte encodes
//! 7 bits of the value, least significant group first; the most significant bit
//! indicates that another byte follows. At most 4 bytes are allowed, which
//! bounds the value to 268,435,455 (0xFF,0xFF,0xFF,0x7F).

use super::error::{Error, Result};
use super::packet::MAX_REMAINING_LENGTH;
use heapless::Vec;

/// Maximum number of bytes in an encoded Remaining Length.
pub const MAX_ENCODED_LENGTH: usize = 4;

const CONTINUATION_BIT: u8 = 0x80;
const VALUE_MASK: u8 = 0x7F;

/// An encoded Remaining Length.
pub type EncodedLength = Vec<u8, MAX_ENCODED_LENGTH>;

/// Number of bytes needed to encode `len`.
///
/// Returns [`Error::BadParameter`] if `len` exceeds [`MAX_REMAINING_LENGTH`].
pub fn encoded_size(len: usize) -> Result<usize> {
    match len {
        0..=127 => Ok(1),
        128..=16_383 => Ok(2),
        16_384..=2_097_151 => Ok(3),
        2_097_152..=MAX_REMAINING_LENGTH => Ok(4),
        _ => Err(Error::BadParameter),
    }
}

/// Encode the remaining length field for an MQTT packet.
///
/// # Errors
///
/// [`Error::BadParameter`] if `len` does not fit in 4 encoded bytes.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::network::application::mqtt::varint::encode_remaining_length;
///
/// assert_eq!(&encode_remaining_length(0).unwrap()[..], &[0x00]);
/// assert_eq!(&encode_remaining_length(321).unwrap()[..], &[0xC1, 0x02]);
/// assert!(encode_remaining_length(268_435_456).is_err());
/// ```
pub fn encode_remaining_length(mut len: usize) -> Result<EncodedLength> {
    if len > MAX_REMAINING_LENGTH {
        return Err(Error::BadParameter);
    }

    let mut buf = EncodedLength::new();
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= CONTINUATION_BIT;
        }
        buf.push(byte).map_err(|_| Error::BadParameter)?;
        if len == 0 {
            break;
        }
    }
    Ok(buf)
}

/// Incremental Remaining Length decoder.
///
/// Bytes are fed one at a time so the framer never reads past the fixed header
/// into a payload it has not sized a buffer for yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingLengthDecoder {
    value: usize,
    multiplier: usize,
    bytes: usize,
}

impl RemainingLengthDecoder {
    /// Create a decoder expecting the first length byte.
    pub fn new() -> Self {
        Self {
            value: 0,
            multiplier: 1,
            bytes: 0,
        }
    }

    /// Feed the next encoded byte.
    ///
    /// Returns `Ok(Some(len))` once the final byte has been seen and `Ok(None)`
    /// while more bytes are expected.
    ///
    /// # Errors
    ///
    /// [`Error::BadResponse`] if a fourth byte still has the continuation bit
    /// set, or if the value was not encoded in the minimum number of bytes.
    pub fn push(&mut self, byte: u8) -> Result<Option<usize>> {
        if self.bytes >= MAX_ENCODED_LENGTH {
            return Err(Error::BadResponse);
        }

        self.value += (byte & VALUE_MASK) as usize * self.multiplier;
        self.multiplier *= 128;
        self.bytes += 1;

        if byte & CONTINUATION_BIT != 0 {
            if self.bytes == MAX_ENCODED_LENGTH {
                warn!("remaining length continues past 4 bytes");
                return Err(Error::BadResponse);
            }
            return Ok(None);
        }

        // Overlong encodings such as 0x80 0x00 are malformed.
        if encoded_size(self.value)? != self.bytes {
            warn!("non-minimal remaining length encoding");
            return Err(Error::BadResponse);
        }

        Ok(Some(self.value))
    }

    /// Number of bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.bytes
    }
}

impl Default for RemainingLengthDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a Remaining Length from the start of `bytes`.
///
/// Returns the decoded value and the number of bytes it occupied.
///
/// # Errors
///
/// [`Error::BadResponse`] if the encoding is malformed or `bytes` ends before
/// the final length byte.
pub fn decode_remaining_length(bytes: &[u8]) -> Result<(usize, usize)> {
    let mut decoder = RemainingLengthDecoder::new();
    for &byte in bytes.iter().take(MAX_ENCODED_LENGTH) {
        if let Some(len) = decoder.push(byte)? {
            return Ok((len, decoder.consumed()));
        }
    }
    Err(Error::BadResponse)
}
