//! Deserialization of framed incoming packets.
//!
//! The input is a [`PacketInfo`] whose `remaining_data` holds the bytes that
//! followed the fixed header. Topics and payloads in the output borrow from
//! that buffer; nothing is copied.

use super::error::{Error, Result};
use super::packet::{
    AckType, PUBLISH_FLAG_DUP, PUBLISH_FLAG_QOS_MASK, PUBLISH_FLAG_QOS_SHIFT,
    PUBLISH_FLAG_RETAIN, PacketInfo, PacketType, PublishInfo, QoS,
};

/// Smallest QoS 0 PUBLISH: topic length prefix and a one byte topic.
const PUBLISH_QOS0_MIN_LENGTH: usize = 3;
/// Smallest QoS 1/2 PUBLISH: adds the packet identifier.
const PUBLISH_QOS_MIN_LENGTH: usize = 5;
const CONNACK_REMAINING_LENGTH: usize = 2;
const CONNACK_RESERVED_MASK: u8 = 0xFE;
const CONNACK_SESSION_PRESENT: u8 = 0x01;
const SUBACK_MIN_LENGTH: usize = 3;
const SUBACK_FAILURE: u8 = 0x80;
const PACKET_ID_ACK_LENGTH: usize = 2;

/// CONNACK return codes defined by MQTT 3.1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnackReturnCode {
    /// Connection accepted.
    Accepted = 0,
    /// The server does not support the requested protocol level.
    UnacceptableProtocolVersion = 1,
    /// The client identifier is not allowed.
    IdentifierRejected = 2,
    /// The MQTT service is unavailable.
    ServerUnavailable = 3,
    /// The user name or password is malformed.
    BadUserNameOrPassword = 4,
    /// The client is not authorized to connect.
    NotAuthorized = 5,
}

impl ConnackReturnCode {
    /// Decode a return code byte; values above 5 are reserved.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ConnackReturnCode::Accepted),
            1 => Some(ConnackReturnCode::UnacceptableProtocolVersion),
            2 => Some(ConnackReturnCode::IdentifierRejected),
            3 => Some(ConnackReturnCode::ServerUnavailable),
            4 => Some(ConnackReturnCode::BadUserNameOrPassword),
            5 => Some(ConnackReturnCode::NotAuthorized),
            _ => None,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnackReturnCode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConnackReturnCode::Accepted => defmt::write!(f, "Accepted"),
            ConnackReturnCode::UnacceptableProtocolVersion => {
                defmt::write!(f, "UnacceptableProtocolVersion")
            }
            ConnackReturnCode::IdentifierRejected => defmt::write!(f, "IdentifierRejected"),
            ConnackReturnCode::ServerUnavailable => defmt::write!(f, "ServerUnavailable"),
            ConnackReturnCode::BadUserNameOrPassword => defmt::write!(f, "BadUserNameOrPassword"),
            ConnackReturnCode::NotAuthorized => defmt::write!(f, "NotAuthorized"),
        }
    }
}

/// A deserialized PUBLISH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingPublish<'a> {
    /// Packet identifier, present for QoS 1 and 2.
    pub packet_id: Option<u16>,
    /// Flags, topic and payload, borrowed from the receive buffer.
    pub info: PublishInfo<'a>,
}

/// A deserialized acknowledgment-family packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack<'a> {
    /// Connection accepted.
    ConnAck {
        /// The server resumed an existing session.
        session_present: bool,
    },
    /// All subscriptions in the request were granted.
    SubAck {
        /// Identifier of the SUBSCRIBE.
        packet_id: u16,
        /// Granted QoS per requested filter, in request order.
        return_codes: &'a [u8],
    },
    /// UNSUBSCRIBE acknowledged.
    UnsubAck {
        /// Identifier of the UNSUBSCRIBE.
        packet_id: u16,
    },
    /// PUBACK, PUBREC, PUBREL or PUBCOMP.
    Publish {
        /// Which acknowledgment.
        ack_type: AckType,
        /// Identifier of the PUBLISH being acknowledged.
        packet_id: u16,
    },
    /// Response to PINGREQ.
    PingResp,
}

impl Ack<'_> {
    /// The packet identifier, for the kinds that carry one.
    pub fn packet_id(&self) -> Option<u16> {
        match self {
            Ack::SubAck { packet_id, .. }
            | Ack::UnsubAck { packet_id }
            | Ack::Publish { packet_id, .. } => Some(*packet_id),
            Ack::ConnAck { .. } | Ack::PingResp => None,
        }
    }
}

/// A negative acknowledgment from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal<'a> {
    /// CONNACK with a nonzero return code.
    Connect {
        /// Why the connection was refused.
        return_code: ConnackReturnCode,
    },
    /// SUBACK with at least one failure code.
    Subscribe {
        /// Identifier of the SUBSCRIBE.
        packet_id: u16,
        /// Granted QoS or `0x80` per requested filter, in request order.
        return_codes: &'a [u8],
    },
}

impl Refusal<'_> {
    /// Identifier of the refused SUBSCRIBE; CONNACK carries none.
    pub fn packet_id(&self) -> Option<u16> {
        match self {
            Refusal::Connect { .. } => None,
            Refusal::Subscribe { packet_id, .. } => Some(*packet_id),
        }
    }
}

/// Any packet a client may receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingPacket<'a> {
    /// An application message.
    Publish(IncomingPublish<'a>),
    /// An acknowledgment or ping response.
    Ack(Ack<'a>),
}

/// Cursor over received bytes. Running out of data is a malformed packet.
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.data.len() {
            return Err(Error::BadResponse);
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn rest(self) -> &'a [u8] {
        self.data
    }
}

/// The `remaining_length` bytes of a descriptor.
fn remaining<'a>(packet: &PacketInfo<'a>) -> Result<&'a [u8]> {
    packet
        .remaining_data
        .get(..packet.remaining_length)
        .ok_or(Error::BadParameter)
}

fn nonzero_packet_id(packet_id: u16) -> Result<u16> {
    if packet_id == 0 {
        warn!("packet identifier 0 received");
        return Err(Error::BadResponse);
    }
    Ok(packet_id)
}

fn expect_length(packet: &PacketInfo<'_>, expected: usize) -> Result<()> {
    if packet.remaining_length != expected {
        warn!(
            "remaining length {} where {} is required",
            packet.remaining_length,
            expected
        );
        return Err(Error::BadResponse);
    }
    Ok(())
}

/// Deserialize a PUBLISH packet.
///
/// # Errors
///
/// * [`Error::BadParameter`] - not a PUBLISH, or `remaining_data` is shorter
///   than `remaining_length`
/// * [`Error::BadResponse`] - reserved QoS 3, truncated topic or packet
///   identifier, empty or non UTF-8 topic, or a zero packet identifier
pub fn deserialize_publish<'a>(packet: &PacketInfo<'a>) -> Result<IncomingPublish<'a>> {
    if packet.kind() != Some(PacketType::Publish) {
        return Err(Error::BadParameter);
    }
    let data = remaining(packet)?;

    let flags = packet.packet_type;
    let qos_bits = (flags & PUBLISH_FLAG_QOS_MASK) >> PUBLISH_FLAG_QOS_SHIFT;
    let qos = QoS::try_from(qos_bits).map_err(|_| {
        warn!("PUBLISH with reserved QoS 3");
        Error::BadResponse
    })?;

    let min_length = match qos {
        QoS::AtMostOnce => PUBLISH_QOS0_MIN_LENGTH,
        _ => PUBLISH_QOS_MIN_LENGTH,
    };
    if data.len() < min_length {
        warn!("PUBLISH remaining length {} too short", data.len());
        return Err(Error::BadResponse);
    }

    let mut reader = Reader { data };
    let topic_len = reader.u16()? as usize;
    let topic = reader.take(topic_len)?;
    if topic.is_empty() {
        warn!("PUBLISH with empty topic");
        return Err(Error::BadResponse);
    }
    let topic_name = core::str::from_utf8(topic).map_err(|_| Error::BadResponse)?;

    let packet_id = match qos {
        QoS::AtMostOnce => None,
        _ => Some(nonzero_packet_id(reader.u16()?)?),
    };

    let info = PublishInfo {
        qos,
        retain: flags & PUBLISH_FLAG_RETAIN != 0,
        dup: flags & PUBLISH_FLAG_DUP != 0,
        topic_name,
        payload: reader.rest(),
    };
    trace!("PUBLISH with {} payload bytes", info.payload.len());

    Ok(IncomingPublish { packet_id, info })
}

/// An acknowledgment, or the negative acknowledgment it turned out to be.
type AckOutcome<'a> = core::result::Result<Ack<'a>, Refusal<'a>>;

fn deserialize_connack<'a>(packet: &PacketInfo<'a>) -> Result<AckOutcome<'a>> {
    expect_length(packet, CONNACK_REMAINING_LENGTH)?;
    let mut reader = Reader {
        data: remaining(packet)?,
    };
    let flags = reader.u8()?;
    let return_code = reader.u8()?;

    if flags & CONNACK_RESERVED_MASK != 0 {
        warn!("CONNACK reserved bits set: {=u8:#x}", flags);
        return Err(Error::BadResponse);
    }
    let session_present = flags & CONNACK_SESSION_PRESENT != 0;

    match ConnackReturnCode::from_byte(return_code) {
        Some(ConnackReturnCode::Accepted) => Ok(Ok(Ack::ConnAck { session_present })),
        Some(return_code) => {
            // A refused connection never has a session.
            if session_present {
                return Err(Error::BadResponse);
            }
            Ok(Err(Refusal::Connect { return_code }))
        }
        None => {
            warn!("invalid CONNACK return code {}", return_code);
            Err(Error::BadResponse)
        }
    }
}

fn deserialize_suback<'a>(packet: &PacketInfo<'a>) -> Result<AckOutcome<'a>> {
    if packet.remaining_length < SUBACK_MIN_LENGTH {
        warn!("SUBACK remaining length {} too short", packet.remaining_length);
        return Err(Error::BadResponse);
    }
    let mut reader = Reader {
        data: remaining(packet)?,
    };
    let packet_id = nonzero_packet_id(reader.u16()?)?;
    let return_codes = reader.rest();

    let mut refused = false;
    for &code in return_codes {
        match code {
            0x00..=0x02 => {}
            SUBACK_FAILURE => refused = true,
            _ => {
                warn!("invalid SUBACK return code {=u8:#x}", code);
                return Err(Error::BadResponse);
            }
        }
    }
    if refused {
        return Ok(Err(Refusal::Subscribe {
            packet_id,
            return_codes,
        }));
    }

    Ok(Ok(Ack::SubAck {
        packet_id,
        return_codes,
    }))
}

fn deserialize_packet_id<'a>(packet: &PacketInfo<'a>) -> Result<u16> {
    expect_length(packet, PACKET_ID_ACK_LENGTH)?;
    let mut reader = Reader {
        data: remaining(packet)?,
    };
    nonzero_packet_id(reader.u16()?)
}

fn deserialize_ack_outcome<'a>(packet: &PacketInfo<'a>) -> Result<AckOutcome<'a>> {
    let kind = packet.kind().ok_or(Error::BadParameter)?;
    let ack = match kind {
        PacketType::ConnAck => return deserialize_connack(packet),
        PacketType::SubAck => return deserialize_suback(packet),
        PacketType::UnsubAck => Ack::UnsubAck {
            packet_id: deserialize_packet_id(packet)?,
        },
        PacketType::PubAck | PacketType::PubRec | PacketType::PubRel | PacketType::PubComp => {
            let ack_type = AckType::from_packet_type(kind).ok_or(Error::BadParameter)?;
            Ack::Publish {
                ack_type,
                packet_id: deserialize_packet_id(packet)?,
            }
        }
        PacketType::PingResp => {
            expect_length(packet, 0)?;
            Ack::PingResp
        }
        _ => return Err(Error::BadParameter),
    };
    Ok(Ok(ack))
}

/// Deserialize a CONNACK, SUBACK, UNSUBACK, PUBACK, PUBREC, PUBREL, PUBCOMP
/// or PINGRESP.
///
/// A refusal is reported as [`Error::ServerRefused`]; pass the same packet
/// to [`deserialize_refusal`] for the return code or packet identifier.
///
/// # Errors
///
/// * [`Error::BadParameter`] - not an acknowledgment packet, or
///   `remaining_data` is shorter than `remaining_length`
/// * [`Error::BadResponse`] - wrong remaining length for the kind, reserved
///   bits set, invalid return codes, or a zero packet identifier
/// * [`Error::ServerRefused`] - CONNACK with a refusal code, or a SUBACK
///   containing a failure code
pub fn deserialize_ack<'a>(packet: &PacketInfo<'a>) -> Result<Ack<'a>> {
    match deserialize_ack_outcome(packet)? {
        Ok(ack) => {
            debug!("received ack {=u8:#x}", packet.packet_type);
            Ok(ack)
        }
        Err(refusal) => {
            match refusal {
                Refusal::Connect { return_code } => warn!("connection refused: {}", return_code),
                Refusal::Subscribe { packet_id, .. } => {
                    warn!("subscription {} refused", packet_id)
                }
            }
            Err(Error::ServerRefused)
        }
    }
}

/// Details of a CONNACK or SUBACK that [`deserialize_ack`] reported as
/// [`Error::ServerRefused`].
///
/// # Errors
///
/// The same errors as [`deserialize_ack`], and [`Error::BadParameter`] if the
/// packet is a valid acknowledgment that refuses nothing.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::{Error, PacketInfo, Refusal, deserialize_ack, deserialize_refusal};
///
/// let packet = PacketInfo {
///     packet_type: 0x90,
///     remaining_data: &[0x00, 0x07, 0x01, 0x80],
///     remaining_length: 4,
/// };
/// assert_eq!(deserialize_ack(&packet), Err(Error::ServerRefused));
///
/// let refusal = deserialize_refusal(&packet).unwrap();
/// assert_eq!(refusal.packet_id(), Some(7));
/// assert_eq!(
///     refusal,
///     Refusal::Subscribe { packet_id: 7, return_codes: &[0x01, 0x80] }
/// );
/// ```
pub fn deserialize_refusal<'a>(packet: &PacketInfo<'a>) -> Result<Refusal<'a>> {
    match deserialize_ack_outcome(packet)? {
        Ok(_) => Err(Error::BadParameter),
        Err(refusal) => Ok(refusal),
    }
}

/// Deserialize any packet a client may receive.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::{IncomingPacket, PacketInfo, QoS, deserialize};
///
/// let body = [0x00, 0x03, b'a', b'/', b'b', 0x00, 0x07, b'h', b'i'];
/// let packet = PacketInfo {
///     packet_type: 0x33,
///     remaining_data: &body,
///     remaining_length: body.len(),
/// };
///
/// match deserialize(&packet).unwrap() {
///     IncomingPacket::Publish(publish) => {
///         assert_eq!(publish.packet_id, Some(7));
///         assert_eq!(publish.info.qos, QoS::AtLeastOnce);
///         assert!(publish.info.retain);
///         assert_eq!(publish.info.topic_name, "a/b");
///         assert_eq!(publish.info.payload, b"hi");
///     }
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn deserialize<'a>(packet: &PacketInfo<'a>) -> Result<IncomingPacket<'a>> {
    match packet.kind() {
        Some(PacketType::Publish) => deserialize_publish(packet).map(IncomingPacket::Publish),
        Some(_) => deserialize_ack(packet).map(IncomingPacket::Ack),
        None => Err(Error::BadParameter),
    }
}
