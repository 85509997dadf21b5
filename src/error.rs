use thiserror::Error;

/// Failure of a single scan. Every variant reaches the HTTP client the same
/// way, as a flat message; the kind only matters for logs and tests.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("No reader found")]
    NoReaderFound,

    #[error("Failed to select JPN application")]
    ApplicationSelectionFailed { sw1: u8, sw2: u8 },

    #[error("{0}")]
    CardCommunication(#[from] pcsc::Error),

    #[error("{0}")]
    Unexpected(String),
}

impl ScanError {
    /// Short label for the failure category, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoReaderFound => "no_reader_found",
            Self::ApplicationSelectionFailed { .. } => "application_selection_failed",
            Self::CardCommunication(_) => "card_communication_failure",
            Self::Unexpected(_) => "unexpected_failure",
        }
    }
}

/// A field offset table entry that runs past the end of its file.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("field {field} ends at {end:#x}, past file {file_no} length {file_len:#x}")]
pub struct LayoutError {
    pub field: &'static str,
    pub file_no: u16,
    pub end: usize,
    pub file_len: usize,
}

pub type Result<T> = std::result::Result<T, ScanError>;
