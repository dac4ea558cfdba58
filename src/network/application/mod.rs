//! Application layer protocols.
//!
//! Protocol codecs here work on caller-owned buffers and the transport traits
//! from [`network`](crate::network), so they run unchanged on `no_std`
//! targets.

/// MQTT 3.1.1 packet codec.
///
/// Serializes the packets a client sends and frames and deserializes the
/// packets it receives, without heap allocation.
pub mod mqtt;
