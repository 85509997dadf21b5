use crate::card::PcscCard;
use crate::transport::{CardChannel, ReaderBackend, ReaderContext};
use crate::{Result, ScanError};
use pcsc::{Context, Protocols, Scope, ShareMode};
use std::ffi::CString;
use tracing::debug;

/// Establishes a user-scope PC/SC context per scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct PcscBackend;

impl ReaderBackend for PcscBackend {
    fn establish(&self) -> Result<Box<dyn ReaderContext>> {
        Ok(Box::new(PcscReader::new()?))
    }
}

pub struct PcscReader {
    ctx: Context,
}

impl PcscReader {
    pub fn new() -> Result<Self> {
        let ctx = Context::establish(Scope::User)?;
        Ok(Self { ctx })
    }
}

impl ReaderContext for PcscReader {
    fn list_readers(&self) -> Result<Vec<String>> {
        let mut buffer = vec![0u8; 2048];
        let readers = match self.ctx.list_readers(&mut buffer) {
            Ok(readers) => readers,
            // pcsc-lite reports an empty reader list as an error
            Err(pcsc::Error::NoReadersAvailable) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(readers.map(|r| r.to_string_lossy().into_owned()).collect())
    }

    fn connect(&self, reader: &str) -> Result<Box<dyn CardChannel>> {
        let reader_cstr = CString::new(reader)
            .map_err(|e| ScanError::Unexpected(format!("Invalid reader name {:?}: {}", reader, e)))?;

        let card = self
            .ctx
            .connect(&reader_cstr, ShareMode::Shared, Protocols::ANY)?;
        debug!(reader, "Connected to card");

        Ok(Box::new(PcscCard::new(card)))
    }
}
