//! Client settings loaded from JSON.
//!
//! A device usually ships its broker settings as a small JSON document in
//! flash. [`ClientConfig::from_json`] parses it without allocating; every
//! string in the result borrows from the input text, so JSON escapes are not
//! supported in string values.
//!
//! ```json
//! {
//!   "connect": { "clean_session": true, "keep_alive_seconds": 60, "client_identifier": "dev1" },
//!   "will": { "topic": "dev1/status", "message": "offline", "qos": 1, "retain": true },
//!   "subscriptions": [ { "topic_filter": "dev1/cmd/#", "qos": 1 } ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::packet::{ConnectInfo, PublishInfo, QoS, SubscribeInfo};
use super::serialize::OutgoingPacket;

/// Maximum number of subscriptions a [`ClientConfig`] can hold.
pub const MAX_CONFIG_SUBSCRIPTIONS: usize = 8;

/// Last will settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WillConfig<'a> {
    /// Topic the will is published to.
    pub topic: &'a str,
    /// Will message, sent as the payload.
    #[serde(default)]
    pub message: &'a str,
    /// QoS of the will message.
    #[serde(default)]
    pub qos: QoS,
    /// Whether the will is retained.
    #[serde(default)]
    pub retain: bool,
}

impl<'a> WillConfig<'a> {
    /// The will as CONNECT expects it.
    pub fn to_publish_info(&self) -> PublishInfo<'a> {
        PublishInfo {
            qos: self.qos,
            retain: self.retain,
            dup: false,
            topic_name: self.topic,
            payload: self.message.as_bytes(),
        }
    }
}

/// Connection, will and subscription settings for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig<'a> {
    /// CONNECT parameters.
    #[serde(borrow)]
    pub connect: ConnectInfo<'a>,
    /// Optional last will.
    #[serde(borrow, default)]
    pub will: Option<WillConfig<'a>>,
    /// Subscriptions to request after connecting.
    #[serde(borrow, default)]
    pub subscriptions: heapless::Vec<SubscribeInfo<'a>, MAX_CONFIG_SUBSCRIPTIONS>,
}

impl<'a> ClientConfig<'a> {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// [`Error::BadParameter`] if the text is not valid JSON for this shape,
    /// a QoS is outside 0..=2, or more than [`MAX_CONFIG_SUBSCRIPTIONS`]
    /// subscriptions are listed.
    pub fn from_json(json: &'a str) -> Result<Self> {
        let (config, _) = serde_json_core::from_str::<ClientConfig<'a>>(json).map_err(|_| {
            warn!("client configuration is not valid JSON");
            Error::BadParameter
        })?;
        debug!(
            "loaded client configuration with {} subscriptions",
            config.subscriptions.len()
        );
        Ok(config)
    }

    /// The CONNECT packet for these settings.
    pub fn connect_packet(&self) -> OutgoingPacket<'_> {
        OutgoingPacket::Connect {
            info: self.connect,
            will: self.will.map(|will| will.to_publish_info()),
        }
    }

    /// The SUBSCRIBE packet for the configured subscriptions, if any.
    pub fn subscribe_packet(&self, packet_id: u16) -> Option<OutgoingPacket<'_>> {
        if self.subscriptions.is_empty() {
            return None;
        }
        Some(OutgoingPacket::Subscribe {
            subscriptions: &self.subscriptions,
            packet_id,
        })
    }
}
