use crate::apdu::{ADDRESS_FILE, PERSONAL_FILE};
use crate::decoder::{decode_address, decode_personal};
use crate::session::Session;
use crate::transport::{ReaderBackend, ReaderContext};
use crate::types::{MykadRecord, ScanResponse};
use crate::utils::hex_dump;
use crate::Result;
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Hex dump each assembled file at debug level.
    pub dump: bool,
}

/// Read and decode one card. Once a card is connected the session is closed
/// exactly once before returning, whatever stage failed. When no reader is
/// present or the connect itself fails there is no connection, so nothing is
/// closed.
pub fn scan(ctx: &dyn ReaderContext, options: ScanOptions) -> Result<MykadRecord> {
    let mut session = Session::open(ctx)?;
    let result = read_record(&mut session, options);
    session.close();
    result
}

fn read_record(session: &mut Session, options: ScanOptions) -> Result<MykadRecord> {
    session.select_application()?;

    let personal = read_file(session, PERSONAL_FILE, options)?;
    let address = read_file(session, ADDRESS_FILE, options)?;

    Ok(MykadRecord {
        personal: decode_personal(&personal),
        address: decode_address(&address),
    })
}

fn read_file(session: &mut Session, file_no: u16, options: ScanOptions) -> Result<Vec<u8>> {
    let data = session.read_file(file_no)?;
    if options.dump {
        debug!(file_no, len = data.len(), dump = %hex_dump(&data), "File hex dump");
    }
    Ok(data)
}

/// Establish a reader context, scan once and render the client response.
pub fn run(backend: &dyn ReaderBackend, options: ScanOptions) -> ScanResponse {
    let started = Instant::now();
    let result = backend.establish().and_then(|ctx| scan(ctx.as_ref(), options));

    match &result {
        Ok(_) => info!(elapsed_ms = started.elapsed().as_millis() as u64, "Card scanned"),
        Err(e) => error!(kind = e.kind(), error = %e, "Card scan failed"),
    }

    result.into()
}
