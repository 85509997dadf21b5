use serde::Serialize;
use std::collections::BTreeMap;

/// Decoded fields keyed by their table name.
pub type FieldMap = BTreeMap<&'static str, String>;

/// Result of one APDU exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitResult {
    pub data: Vec<u8>,
    pub sw1: u8,
    pub sw2: u8,
}

impl TransmitResult {
    /// Split a raw response into payload and trailing status word.
    /// Responses shorter than two bytes carry no status word (reported as 0).
    pub fn from_raw(raw: &[u8]) -> Self {
        if raw.len() < 2 {
            return Self {
                data: raw.to_vec(),
                sw1: 0,
                sw2: 0,
            };
        }
        let split = raw.len() - 2;
        Self {
            data: raw[..split].to_vec(),
            sw1: raw[split],
            sw2: raw[split + 1],
        }
    }

    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    pub fn status_word(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }
}

/// Personal data read from files 1 and 4
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MykadRecord {
    #[serde(flatten)]
    pub personal: FieldMap,
    pub address: FieldMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Error,
}

/// Body returned by `GET /api/mykad-reader`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResponse {
    pub status: ScanStatus,
    pub message: String,
    pub data: serde_json::Value,
}

pub const SUCCESS_MESSAGE: &str = "Smart card scanned successfully.";

impl ScanResponse {
    pub fn success(record: &MykadRecord) -> Self {
        Self {
            status: ScanStatus::Success,
            message: SUCCESS_MESSAGE.to_string(),
            data: serde_json::to_value(record)
                .unwrap_or_else(|_| serde_json::Value::Object(Default::default())),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ScanStatus::Error,
            message: message.into(),
            data: serde_json::Value::Object(Default::default()),
        }
    }
}

impl From<crate::Result<MykadRecord>> for ScanResponse {
    fn from(result: crate::Result<MykadRecord>) -> Self {
        match result {
            Ok(record) => Self::success(&record),
            Err(e) => Self::error(e.to_string()),
        }
    }
}
