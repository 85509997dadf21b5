//! MyKad reader - reads the Malaysian national identity card over PC/SC and
//! decodes the JPN personal and address files.
//!
//! [`scan::scan`] performs one complete read against a [`ReaderContext`];
//! [`server::router`] exposes it as `GET /api/mykad-reader`.

pub mod apdu;
pub mod card;
pub mod config;
pub mod decoder;
pub mod error;
pub mod mock;
pub mod reader;
pub mod scan;
pub mod server;
pub mod session;
pub mod transport;
pub mod types;
pub mod utils;

pub use card::PcscCard;
pub use decoder::{decode_address, decode_personal, validate_layout};
pub use error::{LayoutError, Result, ScanError};
pub use reader::{PcscBackend, PcscReader};
pub use scan::{scan, ScanOptions};
pub use session::Session;
pub use transport::{CardChannel, ReaderBackend, ReaderContext};
pub use types::{MykadRecord, ScanResponse, ScanStatus, TransmitResult};
pub use utils::version;
