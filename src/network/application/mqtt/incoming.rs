//! Incoming packet framing.
//!
//! Reads the fixed header of the next packet from a transport: one type byte,
//! then the Remaining Length one byte at a time. The variable header and
//! payload are left on the transport; the caller reads exactly
//! `remaining_length` further bytes into a buffer of its choosing and hands
//! them to the [`deserialize`](super::deserialize) routines.

use super::error::{Error, Result};
use super::packet::{PacketInfo, PacketType};
use super::varint::RemainingLengthDecoder;
#[cfg(feature = "async")]
use crate::network::AsyncRead;
use crate::network::Read;

fn check_packet_type(packet_type: u8) -> Result<()> {
    match PacketType::from_header(packet_type) {
        Some(kind) => {
            trace!("incoming {}", kind);
            Ok(())
        }
        None => {
            warn!("invalid packet type byte {=u8:#x}", packet_type);
            Err(Error::BadResponse)
        }
    }
}

/// Result of reading the packet type byte.
fn check_type_read<E>(read: core::result::Result<usize, E>) -> Result<()> {
    match read {
        Ok(0) => Err(Error::NoDataAvailable),
        Ok(_) => Ok(()),
        Err(_) => {
            warn!("transport receive failed reading packet type");
            Err(Error::RecvFailed)
        }
    }
}

/// Result of reading one Remaining Length byte.
fn check_length_read<E>(
    read: core::result::Result<usize, E>,
    decoder: &RemainingLengthDecoder,
) -> Result<()> {
    match read {
        Ok(0) => {
            warn!("remaining length truncated after {} bytes", decoder.consumed());
            Err(Error::BadResponse)
        }
        Ok(_) => Ok(()),
        Err(_) => {
            warn!("transport receive failed reading remaining length");
            Err(Error::RecvFailed)
        }
    }
}

fn framed(packet_type: u8, remaining_length: usize) -> PacketInfo<'static> {
    debug!(
        "framed packet {=u8:#x}, remaining length {}",
        packet_type,
        remaining_length
    );
    PacketInfo {
        packet_type,
        remaining_data: &[],
        remaining_length,
    }
}

/// Read the packet type and Remaining Length of the next incoming packet.
///
/// The returned descriptor has an empty `remaining_data`; attach the bytes
/// with [`PacketInfo::with_remaining_data`] once they have been read.
///
/// # Errors
///
/// * [`Error::NoDataAvailable`] - the very first read returned no bytes; try
///   again later
/// * [`Error::RecvFailed`] - the transport reported an error
/// * [`Error::BadResponse`] - invalid type byte, or a malformed or truncated
///   Remaining Length
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::network::RecvFn;
/// use libiot_mqtt::network::application::mqtt::{
///     deserialize_ack, get_incoming_packet_type_and_length, Ack,
/// };
///
/// let wire = [0x20u8, 0x02, 0x00, 0x00];
/// let mut pos = 0;
/// let mut recv = RecvFn(|buf: &mut [u8]| {
///     let n = buf.len().min(wire.len() - pos);
///     buf[..n].copy_from_slice(&wire[pos..pos + n]);
///     pos += n;
///     n as i32
/// });
///
/// let packet = get_incoming_packet_type_and_length(&mut recv).unwrap();
/// assert_eq!(packet.remaining_length, 2);
///
/// let mut body = [0u8; 2];
/// body.copy_from_slice(&wire[2..]);
/// let ack = deserialize_ack(&packet.with_remaining_data(&body)).unwrap();
/// assert_eq!(ack, Ack::ConnAck { session_present: false });
/// ```
pub fn get_incoming_packet_type_and_length<R: Read>(
    transport: &mut R,
) -> Result<PacketInfo<'static>> {
    let mut header_buf = [0u8; 1];
    check_type_read(transport.read(&mut header_buf))?;
    let packet_type = header_buf[0];
    check_packet_type(packet_type)?;

    let mut decoder = RemainingLengthDecoder::new();
    loop {
        let mut length_buf = [0u8; 1];
        check_length_read(transport.read(&mut length_buf), &decoder)?;
        if let Some(remaining_length) = decoder.push(length_buf[0])? {
            return Ok(framed(packet_type, remaining_length));
        }
    }
}

/// Asynchronous version of [`get_incoming_packet_type_and_length`].
#[cfg(feature = "async")]
pub async fn get_incoming_packet_type_and_length_async<R: AsyncRead>(
    transport: &mut R,
) -> Result<PacketInfo<'static>> {
    let mut header_buf = [0u8; 1];
    check_type_read(transport.read(&mut header_buf).await)?;
    let packet_type = header_buf[0];
    check_packet_type(packet_type)?;

    let mut decoder = RemainingLengthDecoder::new();
    loop {
        let mut length_buf = [0u8; 1];
        check_length_read(transport.read(&mut length_buf).await, &decoder)?;
        if let Some(remaining_length) = decoder.push(length_buf[0])? {
            return Ok(framed(packet_type, remaining_length));
        }
    }
}
