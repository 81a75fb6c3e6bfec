//! Access to systemd via D-Bus using a Unix domain socket as the
//! transport. The objective of this crate is to list processes with low
//! overhead for the caller: replies stream through a callback and decoded
//! strings are batched in reusable buffers instead of being allocated one
//! by one.
//!
//! ```no_run
//! # fn main() -> systemd_client::Result<()> {
//! let client = systemd_client::Client::new()?;
//!
//! client.list_units(None, |unit| {
//!     println!("{} {}", unit.name, unit.active_state);
//! })?;
//! # Ok(()) }
//! ```

#[doc(inline)]
pub use self::client::Client;
mod client;

#[doc(inline)]
pub use self::client_builder::ClientBuilder;
mod client_builder;

#[doc(inline)]
pub use self::error::{Error, Result};
mod error;

#[doc(inline)]
pub use self::message::Unit;
mod message;

#[doc(inline)]
pub use self::protocol::{Endianness, Flags};
pub mod protocol;

mod convert;
mod decoder;
mod encoder;
mod header;
mod sasl;

#[cfg(test)]
mod fixtures;
