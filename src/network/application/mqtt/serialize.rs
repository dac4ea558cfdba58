//! Packet serialization into caller-provided buffers.
//!
//! Every routine takes the Remaining Length computed by the matching function
//! in [`size`](super::size), re-validates the parameters, and checks the buffer
//! capacity before the first byte is written. A call that fails leaves the
//! buffer untouched.

use super::error::{Error, Result};
use super::packet::{
    AckType, CONNECT, CONNECT_FLAG_CLEAN, CONNECT_FLAG_PASSWORD, CONNECT_FLAG_USERNAME,
    CONNECT_FLAG_WILL, CONNECT_FLAG_WILL_QOS_SHIFT, CONNECT_FLAG_WILL_RETAIN, ConnectInfo,
    DISCONNECT, PINGREQ, PROTOCOL_LEVEL, PROTOCOL_NAME, PUBLISH, PacketSize, PacketType,
    PublishInfo, QoS, SUBSCRIBE, SubscribeInfo, UNSUBSCRIBE,
};
use super::size;
use super::varint;

/// Cursor over the output buffer.
///
/// Every write is bounds checked, so a miscalculated size surfaces as
/// [`Error::NoMemory`] instead of a panic.
struct Writer<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> Writer<'b> {
    fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put_u8(&mut self, value: u8) -> Result<()> {
        let slot = self.buf.get_mut(self.pos).ok_or(Error::NoMemory)?;
        *slot = value;
        self.pos += 1;
        Ok(())
    }

    fn put_u16(&mut self, value: u16) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    fn put_slice(&mut self, data: &[u8]) -> Result<()> {
        let end = self.pos.checked_add(data.len()).ok_or(Error::NoMemory)?;
        self.buf
            .get_mut(self.pos..end)
            .ok_or(Error::NoMemory)?
            .copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    /// A 16-bit length prefix followed by the raw bytes.
    fn put_field(&mut self, data: &[u8]) -> Result<()> {
        let len = u16::try_from(data.len()).map_err(|_| Error::BadParameter)?;
        self.put_u16(len)?;
        self.put_slice(data)
    }

    fn put_fixed_header(&mut self, header: u8, remaining_length: usize) -> Result<()> {
        self.put_u8(header)?;
        self.put_slice(&varint::encode_remaining_length(remaining_length)?)
    }

    fn written(&self) -> usize {
        self.pos
    }
}

/// Check the caller's Remaining Length and the buffer capacity.
fn prepare(expected: PacketSize, remaining_length: usize, needed: usize, capacity: usize) -> Result<()> {
    if remaining_length != expected.remaining_length {
        warn!(
            "remaining length {} does not match computed {}",
            remaining_length,
            expected.remaining_length
        );
        return Err(Error::BadParameter);
    }
    if capacity < needed {
        warn!("buffer of {} bytes cannot hold {} bytes", capacity, needed);
        return Err(Error::NoMemory);
    }
    Ok(())
}

fn require_packet_id(packet_id: u16) -> Result<()> {
    if packet_id == 0 {
        warn!("packet identifier must be nonzero");
        return Err(Error::BadParameter);
    }
    Ok(())
}

/// Serialize a CONNECT packet.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// * [`Error::BadParameter`] - invalid parameters, or `remaining_length` does
///   not match [`size::connect_packet_size`]
/// * [`Error::NoMemory`] - `buffer` is smaller than the packet
pub fn serialize_connect(
    info: &ConnectInfo,
    will: Option<&PublishInfo>,
    remaining_length: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    let expected = size::connect_packet_size(info, will)?;
    prepare(expected, remaining_length, expected.packet_size, buffer.len())?;

    let mut connect_flags = 0;
    if info.clean_session {
        connect_flags |= CONNECT_FLAG_CLEAN;
    }
    if let Some(will) = will {
        connect_flags |= CONNECT_FLAG_WILL;
        connect_flags |= (will.qos as u8) << CONNECT_FLAG_WILL_QOS_SHIFT;
        if will.retain {
            connect_flags |= CONNECT_FLAG_WILL_RETAIN;
        }
    }
    if info.user_name.is_some() {
        connect_flags |= CONNECT_FLAG_USERNAME;
    }
    if info.password.is_some() {
        connect_flags |= CONNECT_FLAG_PASSWORD;
    }

    let mut w = Writer::new(buffer);
    w.put_fixed_header(CONNECT, remaining_length)?;

    // --- Variable Header ---
    w.put_field(PROTOCOL_NAME)?;
    w.put_u8(PROTOCOL_LEVEL)?;
    w.put_u8(connect_flags)?;
    w.put_u16(info.keep_alive_seconds)?;

    // --- Payload ---
    w.put_field(info.client_identifier.as_bytes())?;
    if let Some(will) = will {
        w.put_field(will.topic_name.as_bytes())?;
        w.put_field(will.payload)?;
    }
    if let Some(user_name) = info.user_name {
        w.put_field(user_name.as_bytes())?;
    }
    if let Some(password) = info.password {
        w.put_field(password.as_bytes())?;
    }

    debug!("serialized CONNECT, {} bytes", w.written());
    Ok(w.written())
}

fn serialize_subscription_list(
    header: u8,
    subscriptions: &[SubscribeInfo],
    packet_id: u16,
    remaining_length: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    let with_qos = header == SUBSCRIBE;
    let expected = if with_qos {
        size::subscribe_packet_size(subscriptions)?
    } else {
        size::unsubscribe_packet_size(subscriptions)?
    };
    require_packet_id(packet_id)?;
    prepare(expected, remaining_length, expected.packet_size, buffer.len())?;

    let mut w = Writer::new(buffer);
    w.put_fixed_header(header, remaining_length)?;
    w.put_u16(packet_id)?;
    for subscription in subscriptions {
        w.put_field(subscription.topic_filter.as_bytes())?;
        if with_qos {
            w.put_u8(subscription.qos as u8)?;
        }
    }
    Ok(w.written())
}

/// Serialize a SUBSCRIBE packet.
///
/// # Errors
///
/// * [`Error::BadParameter`] - invalid subscription list, zero `packet_id`, or
///   mismatched `remaining_length`
/// * [`Error::NoMemory`] - `buffer` is smaller than the packet
pub fn serialize_subscribe(
    subscriptions: &[SubscribeInfo],
    packet_id: u16,
    remaining_length: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    let written =
        serialize_subscription_list(SUBSCRIBE, subscriptions, packet_id, remaining_length, buffer)?;
    debug!("serialized SUBSCRIBE id {}, {} bytes", packet_id, written);
    Ok(written)
}

/// Serialize an UNSUBSCRIBE packet.
///
/// The QoS of each entry is ignored.
pub fn serialize_unsubscribe(
    subscriptions: &[SubscribeInfo],
    packet_id: u16,
    remaining_length: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    let written =
        serialize_subscription_list(UNSUBSCRIBE, subscriptions, packet_id, remaining_length, buffer)?;
    debug!("serialized UNSUBSCRIBE id {}, {} bytes", packet_id, written);
    Ok(written)
}

fn publish_header(
    w: &mut Writer<'_>,
    info: &PublishInfo,
    packet_id: u16,
    remaining_length: usize,
) -> Result<()> {
    w.put_fixed_header(PUBLISH | info.header_flags(), remaining_length)?;
    w.put_field(info.topic_name.as_bytes())?;
    if info.qos != QoS::AtMostOnce {
        w.put_u16(packet_id)?;
    }
    Ok(())
}

fn check_publish(info: &PublishInfo, packet_id: u16) -> Result<PacketSize> {
    let expected = size::publish_packet_size(info)?;
    if info.qos != QoS::AtMostOnce {
        require_packet_id(packet_id)?;
    }
    Ok(expected)
}

/// Serialize a complete PUBLISH packet, payload included.
///
/// `packet_id` is only written for QoS 1 and 2, where it must be nonzero.
///
/// # Errors
///
/// * [`Error::BadParameter`] - invalid publish parameters, zero `packet_id`
///   with QoS > 0, or mismatched `remaining_length`
/// * [`Error::NoMemory`] - `buffer` is smaller than the packet
pub fn serialize_publish(
    info: &PublishInfo,
    packet_id: u16,
    remaining_length: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    let expected = check_publish(info, packet_id)?;
    prepare(expected, remaining_length, expected.packet_size, buffer.len())?;

    let mut w = Writer::new(buffer);
    publish_header(&mut w, info, packet_id, remaining_length)?;
    w.put_slice(info.payload)?;

    trace!("serialized PUBLISH, {} bytes", w.written());
    Ok(w.written())
}

/// Serialize only the header of a PUBLISH packet.
///
/// Everything up to the payload is written and the header length returned.
/// The caller then transmits `info.payload` straight from its own memory after
/// the header, so `buffer` only needs room for the header.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::{PublishInfo, QoS};
/// use libiot_mqtt::network::application::mqtt::{serialize, size};
///
/// let payload = [0u8; 4096];
/// let info = PublishInfo {
///     qos: QoS::AtLeastOnce,
///     topic_name: "firmware/chunk",
///     payload: &payload,
///     ..PublishInfo::default()
/// };
/// let size = size::publish_packet_size(&info).unwrap();
///
/// let mut header = [0u8; 32];
/// let header_len =
///     serialize::serialize_publish_header(&info, 7, size.remaining_length, &mut header).unwrap();
/// assert_eq!(header_len + payload.len(), size.packet_size);
/// ```
pub fn serialize_publish_header(
    info: &PublishInfo,
    packet_id: u16,
    remaining_length: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    let expected = check_publish(info, packet_id)?;
    let header_size = expected.packet_size - info.payload.len();
    prepare(expected, remaining_length, header_size, buffer.len())?;

    let mut w = Writer::new(buffer);
    publish_header(&mut w, info, packet_id, remaining_length)?;

    trace!("serialized PUBLISH header, {} bytes", w.written());
    Ok(w.written())
}

/// Serialize a PUBACK, PUBREC, PUBREL or PUBCOMP packet.
///
/// # Errors
///
/// * [`Error::BadParameter`] - `packet_id` is zero
/// * [`Error::NoMemory`] - `buffer` is shorter than 4 bytes
pub fn serialize_ack(ack_type: AckType, packet_id: u16, buffer: &mut [u8]) -> Result<usize> {
    require_packet_id(packet_id)?;
    let expected = size::ack_packet_size();
    prepare(expected, expected.remaining_length, expected.packet_size, buffer.len())?;

    let mut w = Writer::new(buffer);
    w.put_fixed_header(ack_type.header_byte(), expected.remaining_length)?;
    w.put_u16(packet_id)?;
    Ok(w.written())
}

/// Serialize a DISCONNECT packet.
pub fn serialize_disconnect(buffer: &mut [u8]) -> Result<usize> {
    let expected = size::disconnect_packet_size();
    prepare(expected, 0, expected.packet_size, buffer.len())?;

    let mut w = Writer::new(buffer);
    w.put_fixed_header(DISCONNECT, 0)?;
    Ok(w.written())
}

/// Serialize a PINGREQ packet.
pub fn serialize_pingreq(buffer: &mut [u8]) -> Result<usize> {
    let expected = size::pingreq_packet_size();
    prepare(expected, 0, expected.packet_size, buffer.len())?;

    let mut w = Writer::new(buffer);
    w.put_u8(PINGREQ)?;
    w.put_u8(0)?;
    Ok(w.written())
}

/// A packet the client sends, ready to be sized and serialized.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::{OutgoingPacket, PublishInfo, QoS};
///
/// let packet = OutgoingPacket::Publish {
///     info: PublishInfo {
///         qos: QoS::AtLeastOnce,
///         topic_name: "a/b",
///         payload: b"xyz",
///         ..PublishInfo::default()
///     },
///     packet_id: 1,
/// };
///
/// let mut buf = [0u8; 16];
/// let len = packet.encode(&mut buf).unwrap();
/// assert_eq!(&buf[..2], &[0x32, 10]);
/// assert_eq!(len, 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingPacket<'a> {
    /// CONNECT, with an optional last will.
    Connect {
        /// Connection parameters.
        info: ConnectInfo<'a>,
        /// Last will and testament.
        will: Option<PublishInfo<'a>>,
    },
    /// SUBSCRIBE to one or more topic filters.
    Subscribe {
        /// Filters and requested QoS, in order.
        subscriptions: &'a [SubscribeInfo<'a>],
        /// Nonzero packet identifier.
        packet_id: u16,
    },
    /// UNSUBSCRIBE from one or more topic filters.
    Unsubscribe {
        /// Filters, in order.
        subscriptions: &'a [SubscribeInfo<'a>],
        /// Nonzero packet identifier.
        packet_id: u16,
    },
    /// PUBLISH a message.
    Publish {
        /// Message parameters.
        info: PublishInfo<'a>,
        /// Packet identifier, used for QoS 1 and 2 only.
        packet_id: u16,
    },
    /// PUBACK, PUBREC, PUBREL or PUBCOMP.
    Ack {
        /// Which acknowledgment.
        ack_type: AckType,
        /// Identifier of the acknowledged PUBLISH.
        packet_id: u16,
    },
    /// PINGREQ.
    PingReq,
    /// DISCONNECT.
    Disconnect,
}

impl OutgoingPacket<'_> {
    /// The kind of this packet.
    pub fn packet_type(&self) -> PacketType {
        match self {
            OutgoingPacket::Connect { .. } => PacketType::Connect,
            OutgoingPacket::Subscribe { .. } => PacketType::Subscribe,
            OutgoingPacket::Unsubscribe { .. } => PacketType::Unsubscribe,
            OutgoingPacket::Publish { .. } => PacketType::Publish,
            OutgoingPacket::Ack { ack_type, .. } => match ack_type {
                AckType::PubAck => PacketType::PubAck,
                AckType::PubRec => PacketType::PubRec,
                AckType::PubRel => PacketType::PubRel,
                AckType::PubComp => PacketType::PubComp,
            },
            OutgoingPacket::PingReq => PacketType::PingReq,
            OutgoingPacket::Disconnect => PacketType::Disconnect,
        }
    }

    /// Remaining Length and total size of this packet.
    pub fn size(&self) -> Result<PacketSize> {
        match self {
            OutgoingPacket::Connect { info, will } => size::connect_packet_size(info, will.as_ref()),
            OutgoingPacket::Subscribe { subscriptions, .. } => {
                size::subscribe_packet_size(subscriptions)
            }
            OutgoingPacket::Unsubscribe { subscriptions, .. } => {
                size::unsubscribe_packet_size(subscriptions)
            }
            OutgoingPacket::Publish { info, .. } => size::publish_packet_size(info),
            OutgoingPacket::Ack { .. } => Ok(size::ack_packet_size()),
            OutgoingPacket::PingReq => Ok(size::pingreq_packet_size()),
            OutgoingPacket::Disconnect => Ok(size::disconnect_packet_size()),
        }
    }

    /// Serialize this packet using a Remaining Length from [`size`](Self::size).
    ///
    /// Returns the number of bytes written.
    pub fn serialize(&self, remaining_length: usize, buffer: &mut [u8]) -> Result<usize> {
        match self {
            OutgoingPacket::Connect { info, will } => {
                serialize_connect(info, will.as_ref(), remaining_length, buffer)
            }
            OutgoingPacket::Subscribe {
                subscriptions,
                packet_id,
            } => serialize_subscribe(subscriptions, *packet_id, remaining_length, buffer),
            OutgoingPacket::Unsubscribe {
                subscriptions,
                packet_id,
            } => serialize_unsubscribe(subscriptions, *packet_id, remaining_length, buffer),
            OutgoingPacket::Publish { info, packet_id } => {
                serialize_publish(info, *packet_id, remaining_length, buffer)
            }
            OutgoingPacket::Ack {
                ack_type,
                packet_id,
            } => {
                check_fixed_remaining_length(self, remaining_length)?;
                serialize_ack(*ack_type, *packet_id, buffer)
            }
            OutgoingPacket::PingReq => {
                check_fixed_remaining_length(self, remaining_length)?;
                serialize_pingreq(buffer)
            }
            OutgoingPacket::Disconnect => {
                check_fixed_remaining_length(self, remaining_length)?;
                serialize_disconnect(buffer)
            }
        }
    }

    /// Size and serialize this packet in one call.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize> {
        let size = self.size()?;
        self.serialize(size.remaining_length, buffer)
    }
}

fn check_fixed_remaining_length(packet: &OutgoingPacket<'_>, remaining_length: usize) -> Result<()> {
    if packet.size()?.remaining_length != remaining_length {
        return Err(Error::BadParameter);
    }
    Ok(())
}
