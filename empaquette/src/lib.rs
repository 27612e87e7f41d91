//! A library representing the MQTT 3.1.1 protocol with a focus on encoding to and decoding from byte streams.
//!
//! Whenever documentation in this crate refers to "the standard", it refers to the official
//! [OASIS MQTT v3.1.1 standard](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html).
//!
//! Packets are read from any [std::io::Read] and written to any [std::io::Write]; [Session] ties the two to one
//! connection. Everything is blocking, timeouts belong to the transport.

pub mod error;
pub mod packet;
pub mod session;
pub mod types;

pub use self::session::Session;
