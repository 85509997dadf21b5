//! Reader-access seam consumed by the session driver.
//!
//! The four operations a card reader layer must expose are reader
//! enumeration, connect, transmit and disconnect. [`crate::reader`] provides
//! the PC/SC implementation and [`crate::mock`] an in-memory card for tests.

use crate::types::TransmitResult;
use crate::Result;

/// Produces a fresh reader context for each scan.
pub trait ReaderBackend: Send + Sync {
    fn establish(&self) -> Result<Box<dyn ReaderContext>>;
}

/// An established reader-access context.
pub trait ReaderContext {
    /// Reader names in platform enumeration order. An empty list is not an error.
    fn list_readers(&self) -> Result<Vec<String>>;

    /// Connect to the card present in `reader`.
    fn connect(&self, reader: &str) -> Result<Box<dyn CardChannel>>;
}

/// A live connection to one card.
pub trait CardChannel: Send {
    /// Send one command APDU and return the response split at its status word.
    fn transmit(&mut self, command: &[u8]) -> Result<TransmitResult>;

    /// Release the card. Called at most once per channel by the session driver.
    fn disconnect(&mut self) -> Result<()>;
}
