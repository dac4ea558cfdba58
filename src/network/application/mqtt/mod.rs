//! MQTT 3.1.1 packet codec for embedded systems.
//!
//! This module turns MQTT control packets into bytes and back without heap
//! allocation. It does not own a connection, track session state, or retry
//! anything: the application decides when to send and what to do with what
//! it receives.
//!
//! # Outgoing packets
//!
//! Every packet the client sends is serialized in two steps. A size function
//! validates the parameters and computes the Remaining Length and total
//! packet size; the matching serializer then writes the packet into a
//! caller-supplied buffer. [`OutgoingPacket`] wraps both steps.
//!
//! # Incoming packets
//!
//! [`get_incoming_packet_type_and_length`] reads only the fixed header from a
//! [`Read`](crate::network::Read) transport. The caller then reads
//! `remaining_length` bytes into its own buffer and passes them to
//! [`deserialize`], [`deserialize_publish`] or [`deserialize_ack`]. When the
//! server refuses a CONNECT or SUBSCRIBE, [`deserialize_refusal`] recovers
//! the return code or packet identifier.
//!
//! ```rust
//! use libiot_mqtt::network::Read;
//! use libiot_mqtt::network::application::mqtt::{
//!     get_incoming_packet_type_and_length, deserialize, IncomingPacket, OutgoingPacket,
//!     PublishInfo, QoS,
//! };
//! # struct Loopback<'a> { data: &'a [u8] }
//! # impl Read for Loopback<'_> {
//! #     type Error = ();
//! #     fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
//! #         let n = buf.len().min(self.data.len());
//! #         buf[..n].copy_from_slice(&self.data[..n]);
//! #         self.data = &self.data[n..];
//! #         Ok(n)
//! #     }
//! # }
//!
//! let mut wire = [0u8; 64];
//! let publish = OutgoingPacket::Publish {
//!     info: PublishInfo {
//!         qos: QoS::AtLeastOnce,
//!         topic_name: "sensors/temp",
//!         payload: b"21.5",
//!         ..PublishInfo::default()
//!     },
//!     packet_id: 42,
//! };
//! let len = publish.encode(&mut wire).unwrap();
//!
//! let mut transport = Loopback { data: &wire[..len] };
//! let packet = get_incoming_packet_type_and_length(&mut transport).unwrap();
//!
//! let mut body = [0u8; 64];
//! let body = &mut body[..packet.remaining_length];
//! transport.read(body).unwrap();
//!
//! match deserialize(&packet.with_remaining_data(body)).unwrap() {
//!     IncomingPacket::Publish(incoming) => {
//!         assert_eq!(incoming.packet_id, Some(42));
//!         assert_eq!(incoming.info.topic_name, "sensors/temp");
//!         assert_eq!(incoming.info.payload, b"21.5");
//!     }
//!     IncomingPacket::Ack(_) => unreachable!(),
//! }
//! ```

pub mod config;
pub mod deserialize;
pub mod error;
pub mod incoming;
pub mod packet;
pub mod serialize;
pub mod size;
pub mod varint;

pub use config::{ClientConfig, MAX_CONFIG_SUBSCRIPTIONS, WillConfig};
pub use deserialize::{
    Ack, ConnackReturnCode, IncomingPacket, IncomingPublish, Refusal, deserialize,
    deserialize_ack, deserialize_publish, deserialize_refusal,
};
pub use error::{Error, Result};
pub use incoming::get_incoming_packet_type_and_length;
#[cfg(feature = "async")]
pub use incoming::get_incoming_packet_type_and_length_async;
pub use packet::*;
pub use serialize::{
    OutgoingPacket, serialize_ack, serialize_connect, serialize_disconnect, serialize_pingreq,
    serialize_publish, serialize_publish_header, serialize_subscribe, serialize_unsubscribe,
};
pub use size::{
    ack_packet_size, connect_packet_size, disconnect_packet_size, pingreq_packet_size,
    publish_packet_size, subscribe_packet_size, unsubscribe_packet_size,
};
