//! Packet size calculation.
//!
//! Each function validates the packet parameters against the MQTT 3.1.1 limits
//! and returns the Remaining Length and the total packet size. Nothing is
//! written; the caller uses the result to pick or check a buffer before
//! serializing.

use super::error::{Error, Result};
use super::packet::{
    ConnectInfo, DISCONNECT_PACKET_SIZE, MAX_REMAINING_LENGTH, MAX_STRING_LENGTH,
    PINGREQ_PACKET_SIZE, PUBLISH_ACK_PACKET_SIZE, PacketSize, PublishInfo, QoS, SubscribeInfo,
};
use super::varint;

/// Protocol name, level, connect flags and keep-alive.
const CONNECT_VARIABLE_HEADER_SIZE: usize = 10;
/// Length prefix of a string field.
const STRING_PREFIX_SIZE: usize = 2;
const PACKET_ID_SIZE: usize = 2;

/// Size on the wire of a 16-bit length-prefixed field.
pub(crate) fn string_field_size(field: &[u8]) -> Result<usize> {
    if field.len() > MAX_STRING_LENGTH {
        warn!("string field of {} bytes exceeds 65535", field.len());
        return Err(Error::BadParameter);
    }
    Ok(STRING_PREFIX_SIZE + field.len())
}

/// A topic name must be non-empty and may not contain wildcards.
pub(crate) fn validate_topic_name(topic: &str) -> Result<()> {
    if topic.is_empty() {
        warn!("empty topic name");
        return Err(Error::BadParameter);
    }
    if topic.bytes().any(|b| b == b'+' || b == b'#') {
        warn!("topic name contains a wildcard");
        return Err(Error::BadParameter);
    }
    Ok(())
}

/// Total packet size for a given Remaining Length.
fn packet_size(remaining_length: usize) -> Result<PacketSize> {
    if remaining_length > MAX_REMAINING_LENGTH {
        warn!("remaining length {} exceeds the MQTT maximum", remaining_length);
        return Err(Error::BadParameter);
    }
    let header = 1 + varint::encoded_size(remaining_length)?;
    let packet_size = remaining_length
        .checked_add(header)
        .ok_or(Error::BadParameter)?;
    Ok(PacketSize {
        remaining_length,
        packet_size,
    })
}

fn add(total: usize, field: usize) -> Result<usize> {
    total.checked_add(field).ok_or(Error::BadParameter)
}

/// Size of a CONNECT packet, with an optional last will.
///
/// # Errors
///
/// [`Error::BadParameter`] if any string field is longer than 65535 bytes,
/// the client identifier is empty without a clean session, a password is
/// given without a user name, the will topic is invalid, or the packet
/// would exceed the maximum Remaining Length.
///
/// # Examples
///
/// ```rust
/// use libiot_mqtt::ConnectInfo;
/// use libiot_mqtt::network::application::mqtt::size::connect_packet_size;
///
/// let info = ConnectInfo {
///     clean_session: true,
///     keep_alive_seconds: 60,
///     client_identifier: "dev1",
///     user_name: None,
///     password: None,
/// };
/// let size = connect_packet_size(&info, None).unwrap();
/// assert_eq!(size.remaining_length, 16);
/// assert_eq!(size.packet_size, 18);
/// ```
pub fn connect_packet_size(info: &ConnectInfo, will: Option<&PublishInfo>) -> Result<PacketSize> {
    if info.client_identifier.is_empty() && !info.clean_session {
        warn!("empty client identifier requires a clean session");
        return Err(Error::BadParameter);
    }
    if info.password.is_some() && info.user_name.is_none() {
        warn!("password given without a user name");
        return Err(Error::BadParameter);
    }

    let mut remaining = CONNECT_VARIABLE_HEADER_SIZE;
    remaining = add(remaining, string_field_size(info.client_identifier.as_bytes())?)?;

    if let Some(will) = will {
        validate_topic_name(will.topic_name)?;
        remaining = add(remaining, string_field_size(will.topic_name.as_bytes())?)?;
        remaining = add(remaining, string_field_size(will.payload)?)?;
    }
    if let Some(user_name) = info.user_name {
        remaining = add(remaining, string_field_size(user_name.as_bytes())?)?;
    }
    if let Some(password) = info.password {
        remaining = add(remaining, string_field_size(password.as_bytes())?)?;
    }

    packet_size(remaining)
}

fn subscription_list_size(subscriptions: &[SubscribeInfo], qos_bytes: usize) -> Result<PacketSize> {
    if subscriptions.is_empty() {
        warn!("subscription list is empty");
        return Err(Error::BadParameter);
    }

    let mut remaining = PACKET_ID_SIZE;
    for subscription in subscriptions {
        if subscription.topic_filter.is_empty() {
            warn!("empty topic filter");
            return Err(Error::BadParameter);
        }
        let entry = add(string_field_size(subscription.topic_filter.as_bytes())?, qos_bytes)?;
        remaining = add(remaining, entry)?;
    }

    packet_size(remaining)
}

/// Size of a SUBSCRIBE packet.
///
/// # Errors
///
/// [`Error::BadParameter`] if `subscriptions` is empty, any filter is empty or
/// longer than 65535 bytes, or the packet would exceed the maximum Remaining
/// Length.
pub fn subscribe_packet_size(subscriptions: &[SubscribeInfo]) -> Result<PacketSize> {
    subscription_list_size(subscriptions, 1)
}

/// Size of an UNSUBSCRIBE packet.
///
/// Same rules as [`subscribe_packet_size`], without the requested QoS byte.
pub fn unsubscribe_packet_size(subscriptions: &[SubscribeInfo]) -> Result<PacketSize> {
    subscription_list_size(subscriptions, 0)
}

/// Size of a PUBLISH packet.
///
/// # Errors
///
/// [`Error::BadParameter`] if the topic is empty, contains a wildcard or is
/// longer than 65535 bytes, DUP is set on a QoS 0 message, or the packet
/// would exceed the maximum Remaining Length.
pub fn publish_packet_size(info: &PublishInfo) -> Result<PacketSize> {
    validate_topic_name(info.topic_name)?;
    if info.dup && info.qos == QoS::AtMostOnce {
        warn!("DUP flag set on a QoS 0 publish");
        return Err(Error::BadParameter);
    }

    let mut remaining = string_field_size(info.topic_name.as_bytes())?;
    if info.qos != QoS::AtMostOnce {
        remaining += PACKET_ID_SIZE;
    }
    remaining = add(remaining, info.payload.len())?;

    packet_size(remaining)
}

/// Size of a PUBACK, PUBREC, PUBREL or PUBCOMP packet.
pub fn ack_packet_size() -> PacketSize {
    PacketSize {
        remaining_length: PACKET_ID_SIZE,
        packet_size: PUBLISH_ACK_PACKET_SIZE,
    }
}

/// Size of a DISCONNECT packet.
pub fn disconnect_packet_size() -> PacketSize {
    PacketSize {
        remaining_length: 0,
        packet_size: DISCONNECT_PACKET_SIZE,
    }
}

/// Size of a PINGREQ packet.
pub fn pingreq_packet_size() -> PacketSize {
    PacketSize {
        remaining_length: 0,
        packet_size: PINGREQ_PACKET_SIZE,
    }
}
