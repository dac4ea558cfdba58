//! Status vocabulary shared by every MQTT codec routine.

use core::fmt;

/// Errors reported by the MQTT codec.
///
/// Success is expressed as `Ok(..)`; every other outcome of a codec call maps
/// onto exactly one of these variants. The set is closed so that a session
/// layer can match on one type regardless of which routine it invoked.
///
/// [`IllegalState`](Error::IllegalState), [`StateCollision`](Error::StateCollision)
/// and [`KeepAliveTimeout`](Error::KeepAliveTimeout) are never produced by the
/// codec itself. They belong to the session engine that tracks outstanding
/// QoS 1/2 packet identifiers and keep-alive timers on top of this crate.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// At least one parameter violates an MQTT 3.1.1 constraint.
    BadParameter,
    /// The provided buffer is too small to hold the packet.
    NoMemory,
    /// The transport send function failed.
    SendFailed,
    /// The transport receive function failed.
    RecvFailed,
    /// The bytes received from the server are not a valid MQTT packet.
    BadResponse,
    /// The server refused a CONNECT or SUBSCRIBE.
    ServerRefused,
    /// The transport has no data available right now.
    NoDataAvailable,
    /// An illegal state in the session's packet identifier records.
    IllegalState,
    /// A collision with an existing session record entry.
    StateCollision,
    /// Timed out waiting for a PINGRESP.
    KeepAliveTimeout,
}

impl Error {
    /// Whether the caller should simply try again later.
    ///
    /// Only [`Error::NoDataAvailable`] is a flow-control signal; everything
    /// else is a real failure of the call.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::NoDataAvailable)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::BadParameter => "invalid parameter",
            Error::NoMemory => "buffer too small",
            Error::SendFailed => "transport send failed",
            Error::RecvFailed => "transport receive failed",
            Error::BadResponse => "malformed packet received",
            Error::ServerRefused => "server refused the request",
            Error::NoDataAvailable => "no data available",
            Error::IllegalState => "illegal session state",
            Error::StateCollision => "session state collision",
            Error::KeepAliveTimeout => "keep-alive timeout",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::BadParameter => defmt::write!(f, "BadParameter"),
            Error::NoMemory => defmt::write!(f, "NoMemory"),
            Error::SendFailed => defmt::write!(f, "SendFailed"),
            Error::RecvFailed => defmt::write!(f, "RecvFailed"),
            Error::BadResponse => defmt::write!(f, "BadResponse"),
            Error::ServerRefused => defmt::write!(f, "ServerRefused"),
            Error::NoDataAvailable => defmt::write!(f, "NoDataAvailable"),
            Error::IllegalState => defmt::write!(f, "IllegalState"),
            Error::StateCollision => defmt::write!(f, "StateCollision"),
            Error::KeepAliveTimeout => defmt::write!(f, "KeepAliveTimeout"),
        }
    }
}

/// Result type used throughout the MQTT codec.
pub type Result<T> = core::result::Result<T, Error>;
