//! MyKad (JPN application) command templates and file layout.

/// SELECT by AID for the JPN application.
pub const SELECT_APDU: [u8; 15] = [
    0x00, 0xA4, 0x04, 0x00, 0x0A, 0xA0, 0x00, 0x00, 0x00, 0x74, 0x4A, 0x50, 0x4E, 0x00, 0x10,
];
pub const GET_RESPONSE_APDU: [u8; 5] = [0x00, 0xC0, 0x00, 0x00, 0x05];
pub const SET_LENGTH_APDU: [u8; 8] = [0xC8, 0x32, 0x00, 0x00, 0x05, 0x08, 0x00, 0x00];
pub const SELECT_FILE_APDU: [u8; 5] = [0xCC, 0x00, 0x00, 0x00, 0x08];
pub const GET_DATA_APDU: [u8; 4] = [0xCC, 0x06, 0x00, 0x00];

/// Sub-selector sent between file number and offset in SELECT FILE.
const SELECT_FILE_SUB: [u8; 2] = [0x01, 0x00];

/// Card transport limit for a single GET DATA.
pub const CHUNK_SIZE: u16 = 252;

/// Total length in bytes of each JPN file, indexed by file number.
pub const FILE_LENGTHS: [u16; 8] = [0, 459, 4011, 1227, 171, 43, 43, 0];

pub const PERSONAL_FILE: u16 = 1;
pub const ADDRESS_FILE: u16 = 4;

pub const SW1_SUCCESS: u8 = 0x90;
pub const SW1_MORE_DATA: u8 = 0x61;

/// Declared length of `file_no`, or 0 for numbers outside the table.
pub fn file_length(file_no: u16) -> u16 {
    FILE_LENGTHS.get(usize::from(file_no)).copied().unwrap_or(0)
}

pub fn set_length(length: u16) -> Vec<u8> {
    let mut apdu = SET_LENGTH_APDU.to_vec();
    apdu.extend_from_slice(&length.to_le_bytes());
    apdu
}

pub fn select_file(file_no: u16, offset: u16, length: u16) -> Vec<u8> {
    let mut apdu = SELECT_FILE_APDU.to_vec();
    apdu.extend_from_slice(&file_no.to_le_bytes());
    apdu.extend_from_slice(&SELECT_FILE_SUB);
    apdu.extend_from_slice(&offset.to_le_bytes());
    apdu.extend_from_slice(&length.to_le_bytes());
    apdu
}

/// GET DATA carries only the low byte of the length; chunks never exceed 252.
pub fn get_data(length: u16) -> Vec<u8> {
    let mut apdu = GET_DATA_APDU.to_vec();
    apdu.push(length.to_le_bytes()[0]);
    apdu
}

/// `(offset, length)` pairs covering `[0, total)` in `CHUNK_SIZE` steps.
pub fn chunks(total: u16) -> impl Iterator<Item = (u16, u16)> {
    (0..total)
        .step_by(usize::from(CHUNK_SIZE))
        .map(move |offset| (offset, CHUNK_SIZE.min(total - offset)))
}
