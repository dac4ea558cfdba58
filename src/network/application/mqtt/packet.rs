//! MQTT 3.1.1 packet types, constants and the parameter structures exchanged
//! with the codec.
//!
//! Every structure here borrows its strings and payloads from caller-owned
//! memory. Nothing is copied or allocated.

use super::error::{Error, Result};
use serde::{Deserialize, Serialize};

// MQTT Control Packet types - these are the fixed header packet type values
/// MQTT CONNECT packet type identifier.
pub const CONNECT: u8 = 0x10;
/// MQTT CONNACK packet type identifier.
pub const CONNACK: u8 = 0x20;
/// MQTT PUBLISH packet type identifier (low nibble carries DUP/QoS/RETAIN).
pub const PUBLISH: u8 = 0x30;
/// MQTT PUBACK packet type identifier.
pub const PUBACK: u8 = 0x40;
/// MQTT PUBREC packet type identifier.
pub const PUBREC: u8 = 0x50;
/// MQTT PUBREL packet type identifier.
pub const PUBREL: u8 = 0x62;
/// MQTT PUBCOMP packet type identifier.
pub const PUBCOMP: u8 = 0x70;
/// MQTT SUBSCRIBE packet type identifier.
pub const SUBSCRIBE: u8 = 0x82;
/// MQTT SUBACK packet type identifier.
pub const SUBACK: u8 = 0x90;
/// MQTT UNSUBSCRIBE packet type identifier.
pub const UNSUBSCRIBE: u8 = 0xA2;
/// MQTT UNSUBACK packet type identifier.
pub const UNSUBACK: u8 = 0xB0;
/// MQTT PINGREQ packet type identifier.
pub const PINGREQ: u8 = 0xC0;
/// MQTT PINGRESP packet type identifier.
pub const PINGRESP: u8 = 0xD0;
/// MQTT DISCONNECT packet type identifier.
pub const DISCONNECT: u8 = 0xE0;

/// A PINGREQ packet is always 2 bytes in size.
pub const PINGREQ_PACKET_SIZE: usize = 2;
/// A DISCONNECT packet is always 2 bytes in size.
pub const DISCONNECT_PACKET_SIZE: usize = 2;
/// Size of PUBACK, PUBREC, PUBREL and PUBCOMP packets.
pub const PUBLISH_ACK_PACKET_SIZE: usize = 4;

/// Largest value the Remaining Length field can carry (4 encoded bytes).
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;
/// Largest length of a 16-bit length-prefixed string field.
pub const MAX_STRING_LENGTH: usize = u16::MAX as usize;

// Protocol constants defined by MQTT 3.1.1 specification
pub(crate) const PROTOCOL_NAME: &[u8] = b"MQTT";
pub(crate) const PROTOCOL_LEVEL: u8 = 4; // MQTT 3.1.1

// CONNECT flag bits.
pub(crate) const CONNECT_FLAG_CLEAN: u8 = 0x02;
pub(crate) const CONNECT_FLAG_WILL: u8 = 0x04;
pub(crate) const CONNECT_FLAG_WILL_QOS_SHIFT: u8 = 3;
pub(crate) const CONNECT_FLAG_WILL_RETAIN: u8 = 0x20;
pub(crate) const CONNECT_FLAG_PASSWORD: u8 = 0x40;
pub(crate) const CONNECT_FLAG_USERNAME: u8 = 0x80;

// PUBLISH flag bits in the fixed header.
pub(crate) const PUBLISH_FLAG_RETAIN: u8 = 0x01;
pub(crate) const PUBLISH_FLAG_QOS_SHIFT: u8 = 1;
pub(crate) const PUBLISH_FLAG_QOS_MASK: u8 = 0x06;
pub(crate) const PUBLISH_FLAG_DUP: u8 = 0x08;

/// Quality of Service levels for MQTT messages.
///
/// QoS defines the guarantee of delivery for a specific message.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::QoS;
///
/// assert_eq!(QoS::AtMostOnce as u8, 0);
/// assert_eq!(QoS::try_from(2u8), Ok(QoS::ExactlyOnce));
/// assert!(QoS::try_from(3u8).is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QoS {
    /// **QoS 0**: At most once delivery.
    #[default]
    AtMostOnce = 0,
    /// **QoS 1**: At least once delivery.
    AtLeastOnce = 1,
    /// **QoS 2**: Exactly once delivery.
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(Error::BadParameter),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> u8 {
        qos as u8
    }
}

/// The fourteen MQTT 3.1.1 control packet kinds.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PacketType {
    /// Client request to connect to the server.
    Connect,
    /// Connect acknowledgment.
    ConnAck,
    /// Publish message.
    Publish,
    /// Publish acknowledgment (QoS 1).
    PubAck,
    /// Publish received (QoS 2, part 1).
    PubRec,
    /// Publish release (QoS 2, part 2).
    PubRel,
    /// Publish complete (QoS 2, part 3).
    PubComp,
    /// Subscribe request.
    Subscribe,
    /// Subscribe acknowledgment.
    SubAck,
    /// Unsubscribe request.
    Unsubscribe,
    /// Unsubscribe acknowledgment.
    UnsubAck,
    /// Ping request.
    PingReq,
    /// Ping response.
    PingResp,
    /// Client is disconnecting.
    Disconnect,
}

impl PacketType {
    /// Classify a fixed header byte.
    ///
    /// PUBLISH is matched on its upper nibble only, since its flags are
    /// dynamic. Every other kind must match its reserved flag bits exactly.
    pub fn from_header(byte: u8) -> Option<Self> {
        if byte & 0xF0 == PUBLISH {
            return Some(PacketType::Publish);
        }
        match byte {
            CONNECT => Some(PacketType::Connect),
            CONNACK => Some(PacketType::ConnAck),
            PUBACK => Some(PacketType::PubAck),
            PUBREC => Some(PacketType::PubRec),
            PUBREL => Some(PacketType::PubRel),
            PUBCOMP => Some(PacketType::PubComp),
            SUBSCRIBE => Some(PacketType::Subscribe),
            SUBACK => Some(PacketType::SubAck),
            UNSUBSCRIBE => Some(PacketType::Unsubscribe),
            UNSUBACK => Some(PacketType::UnsubAck),
            PINGREQ => Some(PacketType::PingReq),
            PINGRESP => Some(PacketType::PingResp),
            DISCONNECT => Some(PacketType::Disconnect),
            _ => None,
        }
    }

    /// The fixed header byte for this kind, with PUBLISH flags cleared.
    pub fn header_byte(self) -> u8 {
        match self {
            PacketType::Connect => CONNECT,
            PacketType::ConnAck => CONNACK,
            PacketType::Publish => PUBLISH,
            PacketType::PubAck => PUBACK,
            PacketType::PubRec => PUBREC,
            PacketType::PubRel => PUBREL,
            PacketType::PubComp => PUBCOMP,
            PacketType::Subscribe => SUBSCRIBE,
            PacketType::SubAck => SUBACK,
            PacketType::Unsubscribe => UNSUBSCRIBE,
            PacketType::UnsubAck => UNSUBACK,
            PacketType::PingReq => PINGREQ,
            PacketType::PingResp => PINGRESP,
            PacketType::Disconnect => DISCONNECT,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PacketType {
    fn format(&self, f: defmt::Formatter) {
        match self {
            PacketType::Connect => defmt::write!(f, "CONNECT"),
            PacketType::ConnAck => defmt::write!(f, "CONNACK"),
            PacketType::Publish => defmt::write!(f, "PUBLISH"),
            PacketType::PubAck => defmt::write!(f, "PUBACK"),
            PacketType::PubRec => defmt::write!(f, "PUBREC"),
            PacketType::PubRel => defmt::write!(f, "PUBREL"),
            PacketType::PubComp => defmt::write!(f, "PUBCOMP"),
            PacketType::Subscribe => defmt::write!(f, "SUBSCRIBE"),
            PacketType::SubAck => defmt::write!(f, "SUBACK"),
            PacketType::Unsubscribe => defmt::write!(f, "UNSUBSCRIBE"),
            PacketType::UnsubAck => defmt::write!(f, "UNSUBACK"),
            PacketType::PingReq => defmt::write!(f, "PINGREQ"),
            PacketType::PingResp => defmt::write!(f, "PINGRESP"),
            PacketType::Disconnect => defmt::write!(f, "DISCONNECT"),
        }
    }
}

/// The four acknowledgments of the PUBLISH flow.
///
/// They share one wire layout (fixed header plus packet identifier) and are
/// serialized and deserialized by the same routine.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AckType {
    /// PUBACK, response to a QoS 1 PUBLISH.
    PubAck,
    /// PUBREC, first response to a QoS 2 PUBLISH.
    PubRec,
    /// PUBREL, response to PUBREC.
    PubRel,
    /// PUBCOMP, response to PUBREL.
    PubComp,
}

impl AckType {
    /// The fixed header byte of this acknowledgment.
    pub fn header_byte(self) -> u8 {
        match self {
            AckType::PubAck => PUBACK,
            AckType::PubRec => PUBREC,
            AckType::PubRel => PUBREL,
            AckType::PubComp => PUBCOMP,
        }
    }

    pub(crate) fn from_packet_type(packet_type: PacketType) -> Option<Self> {
        match packet_type {
            PacketType::PubAck => Some(AckType::PubAck),
            PacketType::PubRec => Some(AckType::PubRec),
            PacketType::PubRel => Some(AckType::PubRel),
            PacketType::PubComp => Some(AckType::PubComp),
            _ => None,
        }
    }
}

/// CONNECT packet parameters.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::ConnectInfo;
///
/// let info = ConnectInfo {
///     clean_session: true,
///     keep_alive_seconds: 60,
///     client_identifier: "sensor_device_01",
///     user_name: None,
///     password: None,
/// };
/// assert_eq!(info.client_identifier.len(), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectInfo<'a> {
    /// Whether to start a clean session or resume a previous one.
    #[serde(default)]
    pub clean_session: bool,

    /// The keep-alive interval in seconds. `0` disables keep-alive.
    #[serde(default)]
    pub keep_alive_seconds: u16,

    /// The client identifier, unique per broker.
    ///
    /// May only be empty when `clean_session` is set; the server then assigns
    /// an identifier.
    pub client_identifier: &'a str,

    /// Optional user name.
    #[serde(borrow, default)]
    pub user_name: Option<&'a str>,

    /// Optional password. Requires a user name.
    #[serde(borrow, default)]
    pub password: Option<&'a str>,
}

/// One entry of a SUBSCRIBE or UNSUBSCRIBE request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeInfo<'a> {
    /// Requested maximum QoS. Ignored for UNSUBSCRIBE.
    #[serde(default)]
    pub qos: QoS,
    /// Topic filter, may contain wildcards.
    pub topic_filter: &'a str,
}

/// PUBLISH packet parameters; also used to describe a CONNECT will.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishInfo<'a> {
    /// Quality of Service for the message.
    pub qos: QoS,
    /// Whether the server should retain the message.
    pub retain: bool,
    /// Whether this is a re-delivery of an earlier attempt.
    pub dup: bool,
    /// Topic name. Wildcards are not allowed.
    pub topic_name: &'a str,
    /// Message payload.
    pub payload: &'a [u8],
}

impl PublishInfo<'_> {
    /// The DUP/QoS/RETAIN nibble of the PUBLISH fixed header.
    pub(crate) fn header_flags(&self) -> u8 {
        let mut flags = (self.qos as u8) << PUBLISH_FLAG_QOS_SHIFT;
        if self.dup {
            flags |= PUBLISH_FLAG_DUP;
        }
        if self.retain {
            flags |= PUBLISH_FLAG_RETAIN;
        }
        flags
    }
}

/// Remaining Length and total size of a packet, as computed before
/// serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketSize {
    /// Bytes following the fixed header.
    pub remaining_length: usize,
    /// Fixed header bytes plus `remaining_length`.
    pub packet_size: usize,
}

/// An incoming packet as seen by the deserializer.
///
/// The framer fills `packet_type` and `remaining_length` and leaves
/// `remaining_data` empty. The caller reads exactly `remaining_length` further
/// bytes from the transport and attaches them with
/// [`with_remaining_data`](PacketInfo::with_remaining_data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo<'a> {
    /// Fixed header byte, type and flags.
    pub packet_type: u8,
    /// Bytes following the fixed header.
    pub remaining_data: &'a [u8],
    /// Value of the Remaining Length field.
    pub remaining_length: usize,
}

impl<'a> PacketInfo<'a> {
    /// Rebind this descriptor to the buffer holding its remaining bytes.
    pub fn with_remaining_data<'b>(self, remaining_data: &'b [u8]) -> PacketInfo<'b> {
        PacketInfo {
            packet_type: self.packet_type,
            remaining_data,
            remaining_length: self.remaining_length,
        }
    }

    /// The packet kind, if the type byte is a valid MQTT 3.1.1 header.
    pub fn kind(&self) -> Option<PacketType> {
        PacketType::from_header(self.packet_type)
    }
}
