//! In-memory MyKad for tests. Records every APDU and counts disconnects.

use crate::apdu::{
    GET_DATA_APDU, GET_RESPONSE_APDU, SELECT_APDU, SELECT_FILE_APDU, SET_LENGTH_APDU,
};
use crate::transport::{CardChannel, ReaderBackend, ReaderContext};
use crate::types::TransmitResult;
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const MOCK_READER: &str = "Mock Reader 00 00";

/// Everything the mock card saw, shared between the context and its channels.
#[derive(Debug, Default, Clone)]
pub struct CardLog {
    pub sent: Vec<Vec<u8>>,
    pub connects: Vec<String>,
    pub disconnects: usize,
}

/// Scripted card behaviour.
#[derive(Debug, Clone)]
pub struct MockCard {
    files: HashMap<u16, Vec<u8>>,
    select_status: (u8, u8),
    get_data_status: (u8, u8),
    /// Fail the n-th transmit (0-based) with this error.
    fail_on: Option<(usize, pcsc::Error)>,
    disconnect_error: Option<pcsc::Error>,
}

impl Default for MockCard {
    fn default() -> Self {
        Self {
            files: HashMap::new(),
            select_status: (0x90, 0x00),
            get_data_status: (0x90, 0x00),
            fail_on: None,
            disconnect_error: None,
        }
    }
}

impl MockCard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Card holding the sample personal and address files.
    pub fn sample() -> Self {
        Self::new()
            .with_file(1, sample_personal_file())
            .with_file(4, sample_address_file())
    }

    pub fn with_file(mut self, file_no: u16, data: Vec<u8>) -> Self {
        self.files.insert(file_no, data);
        self
    }

    pub fn with_select_status(mut self, sw1: u8, sw2: u8) -> Self {
        self.select_status = (sw1, sw2);
        self
    }

    pub fn with_get_data_status(mut self, sw1: u8, sw2: u8) -> Self {
        self.get_data_status = (sw1, sw2);
        self
    }

    pub fn fail_on_transmit(mut self, index: usize, error: pcsc::Error) -> Self {
        self.fail_on = Some((index, error));
        self
    }

    pub fn with_disconnect_error(mut self, error: pcsc::Error) -> Self {
        self.disconnect_error = Some(error);
        self
    }
}

/// Reader context over a [`MockCard`]; also serves as its own backend.
#[derive(Debug, Clone)]
pub struct MockContext {
    readers: Vec<String>,
    card: MockCard,
    connect_error: Option<pcsc::Error>,
    log: Arc<Mutex<CardLog>>,
}

impl MockContext {
    pub fn new(card: MockCard) -> Self {
        Self {
            readers: vec![MOCK_READER.to_string()],
            card,
            connect_error: None,
            log: Arc::default(),
        }
    }

    pub fn without_readers() -> Self {
        Self::new(MockCard::new()).with_readers(Vec::new())
    }

    pub fn with_readers(mut self, readers: Vec<String>) -> Self {
        self.readers = readers;
        self
    }

    pub fn with_connect_error(mut self, error: pcsc::Error) -> Self {
        self.connect_error = Some(error);
        self
    }

    /// Snapshot of the exchange log.
    pub fn log(&self) -> CardLog {
        lock(&self.log).clone()
    }
}

impl ReaderBackend for MockContext {
    fn establish(&self) -> Result<Box<dyn ReaderContext>> {
        Ok(Box::new(self.clone()))
    }
}

impl ReaderContext for MockContext {
    fn list_readers(&self) -> Result<Vec<String>> {
        Ok(self.readers.clone())
    }

    fn connect(&self, reader: &str) -> Result<Box<dyn CardChannel>> {
        lock(&self.log).connects.push(reader.to_string());
        if let Some(e) = self.connect_error.clone() {
            return Err(e.into());
        }
        Ok(Box::new(MockChannel {
            card: self.card.clone(),
            log: Arc::clone(&self.log),
            selected: None,
        }))
    }
}

struct MockChannel {
    card: MockCard,
    log: Arc<Mutex<CardLog>>,
    /// (file, offset, length) from the last SELECT FILE
    selected: Option<(u16, usize, usize)>,
}

impl MockChannel {
    fn respond(&mut self, command: &[u8]) -> Vec<u8> {
        let ok = vec![0x90, 0x00];

        if command == &SELECT_APDU[..] {
            let (sw1, sw2) = self.card.select_status;
            return vec![sw1, sw2];
        }
        if command == &GET_RESPONSE_APDU[..] {
            return vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x90, 0x00];
        }
        if command.len() == 10 && command.starts_with(&SET_LENGTH_APDU) {
            return ok;
        }
        if command.len() == 13 && command.starts_with(&SELECT_FILE_APDU) {
            let file_no = u16::from_le_bytes([command[5], command[6]]);
            let offset = u16::from_le_bytes([command[9], command[10]]);
            let length = u16::from_le_bytes([command[11], command[12]]);
            self.selected = Some((file_no, usize::from(offset), usize::from(length)));
            return ok;
        }
        if command.len() == 5 && command.starts_with(&GET_DATA_APDU) {
            let Some((file_no, offset, length)) = self.selected else {
                return vec![0x69, 0x85];
            };
            let file = self.card.files.get(&file_no).map(Vec::as_slice).unwrap_or(&[]);
            let start = offset.min(file.len());
            let end = (offset + length).min(file.len());
            let mut response = file[start..end].to_vec();
            let (sw1, sw2) = self.card.get_data_status;
            response.extend_from_slice(&[sw1, sw2]);
            return response;
        }

        vec![0x6D, 0x00]
    }
}

impl CardChannel for MockChannel {
    fn transmit(&mut self, command: &[u8]) -> Result<TransmitResult> {
        let index = {
            let mut log = lock(&self.log);
            log.sent.push(command.to_vec());
            log.sent.len() - 1
        };
        if let Some((fail_index, e)) = self.card.fail_on.clone() {
            if fail_index == index {
                return Err(e.into());
            }
        }
        Ok(TransmitResult::from_raw(&self.respond(command)))
    }

    fn disconnect(&mut self) -> Result<()> {
        lock(&self.log).disconnects += 1;
        match self.card.disconnect_error.clone() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

fn lock(log: &Mutex<CardLog>) -> MutexGuard<'_, CardLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

fn put(buf: &mut [u8], offset: usize, len: usize, value: &[u8]) {
    let field = &mut buf[offset..offset + len];
    field.fill(b' ');
    field[..value.len()].copy_from_slice(value);
}

/// 459-byte personal file with known field contents.
pub fn sample_personal_file() -> Vec<u8> {
    let mut buf = vec![0u8; 459];
    put(&mut buf, 0x03, 0x28, b"AHMAD BIN ABDULLAH");
    put(&mut buf, 0x99, 30, b"AHMAD");
    put(&mut buf, 0xB7, 20, b"ABDULLAH");
    put(&mut buf, 0x111, 13, b"850101145678");
    buf[0x11E] = b'L';
    put(&mut buf, 0x11F, 8, b"A1234567");
    buf[0x127..0x12B].copy_from_slice(&[0x19, 0x85, 0x01, 0x01]);
    put(&mut buf, 0x12B, 25, b"WILAYAH PERSEKUTUAN");
    buf[0x144..0x148].copy_from_slice(&[0x20, 0x10, 0x06, 0x15]);
    put(&mut buf, 0x148, 18, b"WARGANEGARA");
    put(&mut buf, 0x15A, 25, b"MELAYU");
    put(&mut buf, 0x173, 11, b"ISLAM");
    buf
}

/// 171-byte address file with known field contents. Line 3 is left as
/// zero padding.
pub fn sample_address_file() -> Vec<u8> {
    let mut buf = vec![0u8; 171];
    put(&mut buf, 0x03, 30, b"NO 12 JALAN MERANTI 3");
    put(&mut buf, 0x21, 30, b"TAMAN SRI MUDA");
    buf[0x5D..0x60].copy_from_slice(&[0x43, 0x00, 0x00]);
    put(&mut buf, 0x60, 25, b"KAJANG");
    put(&mut buf, 0x79, 30, b"SELANGOR");
    buf
}
