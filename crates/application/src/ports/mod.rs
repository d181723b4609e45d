//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the token lifecycle core and the
//! surrounding system. Each port is a trait implemented by adapters in the
//! infrastructure layer.

mod clock;
mod key_value_store;
mod navigator;
mod transport;

pub use clock::Clock;
pub use key_value_store::{KeyValueStore, StorageError};
pub use navigator::Navigator;
pub use transport::{Transport, TransportError};
