//! Field decoding for the JPN personal (file 1) and address (file 4) files.
//!
//! Fields live at fixed offsets. Decoding never fails: bytes past the end of
//! a short buffer are treated as missing and invalid UTF-8 is dropped.

use crate::apdu::{file_length, ADDRESS_FILE, PERSONAL_FILE};
use crate::error::LayoutError;
use crate::types::FieldMap;
use crate::utils::hex_pairs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// 4 BCD bytes rendered `YYYY-MM-DD`
    Date,
    /// 3 BCD bytes, first five digits
    Postcode,
    /// `P` or `L`
    Sex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub length: usize,
    pub kind: FieldKind,
}

const fn field(name: &'static str, offset: usize, length: usize, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        offset,
        length,
        kind,
    }
}

pub static PERSONAL_FIELDS: [FieldSpec; 12] = [
    field("name", 0x03, 0x28, FieldKind::Text),
    field("first_name", 0x99, 30, FieldKind::Text),
    field("last_name", 0xB7, 20, FieldKind::Text),
    field("ic", 0x111, 13, FieldKind::Text),
    field("sex", 0x11E, 1, FieldKind::Sex),
    field("old_ic", 0x11F, 8, FieldKind::Text),
    field("dob", 0x127, 4, FieldKind::Date),
    field("state_of_birth", 0x12B, 25, FieldKind::Text),
    field("validity_date", 0x144, 4, FieldKind::Date),
    field("nationality", 0x148, 18, FieldKind::Text),
    field("race", 0x15A, 25, FieldKind::Text),
    field("religion", 0x173, 11, FieldKind::Text),
];

pub static ADDRESS_FIELDS: [FieldSpec; 6] = [
    field("line1", 0x03, 30, FieldKind::Text),
    field("line2", 0x03 + 30, 30, FieldKind::Text),
    field("line3", 0x03 + 60, 30, FieldKind::Text),
    field("postcode", 0x5D, 3, FieldKind::Postcode),
    field("city", 0x60, 25, FieldKind::Text),
    field("state", 0x79, 30, FieldKind::Text),
];

/// Check both offset tables against the declared file lengths. Run once at
/// startup.
pub fn validate_layout() -> Result<(), LayoutError> {
    check_table(PERSONAL_FILE, &PERSONAL_FIELDS)?;
    check_table(ADDRESS_FILE, &ADDRESS_FIELDS)
}

fn check_table(file_no: u16, table: &[FieldSpec]) -> Result<(), LayoutError> {
    let file_len = usize::from(file_length(file_no));
    match table.iter().find(|f| f.offset + f.length > file_len) {
        Some(f) => Err(LayoutError {
            field: f.name,
            file_no,
            end: f.offset + f.length,
            file_len,
        }),
        None => Ok(()),
    }
}

pub fn decode_personal(buffer: &[u8]) -> FieldMap {
    decode_table(&PERSONAL_FIELDS, buffer)
}

pub fn decode_address(buffer: &[u8]) -> FieldMap {
    decode_table(&ADDRESS_FIELDS, buffer)
}

fn decode_table(table: &[FieldSpec], buffer: &[u8]) -> FieldMap {
    table
        .iter()
        .map(|spec| (spec.name, decode_field(spec, buffer)))
        .collect()
}

pub fn decode_field(spec: &FieldSpec, buffer: &[u8]) -> String {
    let bytes = field_slice(buffer, spec.offset, spec.length);
    match spec.kind {
        FieldKind::Text => text_string(bytes),
        FieldKind::Date => date_string(bytes),
        FieldKind::Postcode => postcode_string(bytes),
        FieldKind::Sex => sex_string(bytes.first().copied()),
    }
}

/// `buffer[offset..offset + length]`, truncated to what the buffer holds.
fn field_slice(buffer: &[u8], offset: usize, length: usize) -> &[u8] {
    let start = offset.min(buffer.len());
    let end = offset.saturating_add(length).min(buffer.len());
    &buffer[start..end]
}

/// Copy into a fixed array, zero-filling missing trailing bytes.
fn padded<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let n = bytes.len().min(N);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

/// UTF-8 text with invalid sequences dropped and padding trimmed.
pub fn text_string(bytes: &[u8]) -> String {
    let text: String = bytes.utf8_chunks().map(|chunk| chunk.valid()).collect();
    text.trim_matches(|c: char| c.is_whitespace() || c.is_control())
        .to_string()
}

pub fn date_string(bytes: &[u8]) -> String {
    let [y1, y2, m, d] = padded::<4>(bytes);
    format!("{}-{}-{}", hex_pairs(&[y1, y2]), hex_pairs(&[m]), hex_pairs(&[d]))
}

pub fn postcode_string(bytes: &[u8]) -> String {
    let mut code = hex_pairs(&padded::<3>(bytes));
    code.truncate(5);
    code
}

pub fn sex_string(code: Option<u8>) -> String {
    match code {
        Some(b'P') => "Female".to_string(),
        Some(b'L') => "Male".to_string(),
        Some(other) => char::from(other).to_string(),
        None => String::new(),
    }
}
