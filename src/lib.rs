//! # libiot-mqtt - MQTT 3.1.1 codec for embedded devices
//!
//! A packet-level MQTT 3.1.1 library for IoT devices that cannot afford a heap.
//! It serializes the packets a client sends into caller-supplied buffers, and
//! frames and deserializes the packets it receives from any byte transport.
//! Topics and payloads of received packets borrow from the receive buffer.
//!
//! ## Features
//!
//! - Size calculation and serialization for CONNECT (with last will and
//!   credentials), SUBSCRIBE, UNSUBSCRIBE, PUBLISH, PUBACK, PUBREC, PUBREL,
//!   PUBCOMP, PINGREQ and DISCONNECT
//! - PUBLISH header-only serialization for zero-copy payload transmission
//! - Incoming packet framing that reads only the fixed header
//! - Deserialization of PUBLISH and every acknowledgment a client receives
//! - JSON client configuration through `serde-json-core`
//!
//! Connection management, keep-alive timing, retransmission and session
//! state are left to the application.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libiot-mqtt = "0.1.0"
//! ```
//!
//! ### Connecting
//!
//! ```rust
//! use libiot_mqtt::{ConnectInfo, OutgoingPacket};
//!
//! let connect = OutgoingPacket::Connect {
//!     info: ConnectInfo {
//!         clean_session: true,
//!         keep_alive_seconds: 60,
//!         client_identifier: "dev1",
//!         user_name: None,
//!         password: None,
//!     },
//!     will: None,
//! };
//!
//! let size = connect.size().unwrap();
//! let mut buffer = [0u8; 64];
//! let written = connect.serialize(size.remaining_length, &mut buffer).unwrap();
//! assert_eq!(written, size.packet_size);
//! assert_eq!(&buffer[..2], &[0x10, 16]);
//! // send &buffer[..written] over the transport
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux-based IoT devices (Raspberry Pi, etc.)
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `async`: Enable the async receive trait and async framing
//! - `defmt`: Enable defmt logging support for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

// Must come first so the logging macros are visible to every module.
mod fmt;

/// Network abstraction layer: transport traits and protocol codecs.
pub mod network;

pub use network::application::mqtt::{
    Ack, AckType, ClientConfig, ConnectInfo, Error, IncomingPacket, IncomingPublish,
    OutgoingPacket, PacketInfo, PacketSize, PacketType, PublishInfo, QoS, Refusal, Result,
    SubscribeInfo, deserialize, deserialize_ack, deserialize_publish, deserialize_refusal,
    get_incoming_packet_type_and_length,
};
