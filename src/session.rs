//! Card session driver: reader acquisition, JPN application selection and
//! chunked file reads.

use crate::apdu::{self, CHUNK_SIZE, SW1_MORE_DATA, SW1_SUCCESS};
use crate::transport::{CardChannel, ReaderContext};
use crate::types::TransmitResult;
use crate::utils::hex_dump;
use crate::{Result, ScanError};
use tracing::{debug, trace, warn};

/// One connection to one card. The card is released when the session is
/// closed or dropped, whichever comes first.
pub struct Session {
    channel: Option<Box<dyn CardChannel>>,
    reader: String,
}

impl Session {
    /// Connect to the first reader the platform enumerates. There is no
    /// reader-selection policy beyond that.
    pub fn open(ctx: &dyn ReaderContext) -> Result<Self> {
        let readers = ctx.list_readers()?;
        debug!(count = readers.len(), "Enumerated readers");

        let reader = readers.into_iter().next().ok_or(ScanError::NoReaderFound)?;
        let channel = ctx.connect(&reader)?;

        Ok(Self {
            channel: Some(channel),
            reader,
        })
    }

    pub fn reader(&self) -> &str {
        &self.reader
    }

    fn transmit(&mut self, command: &[u8]) -> Result<TransmitResult> {
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| ScanError::Unexpected("Card session already closed".to_string()))?;

        trace!(command = %hex_dump(command), "APDU >>");
        let response = channel.transmit(command)?;
        trace!(
            len = response.data.len(),
            sw = %format!("{:04X}", response.status_word()),
            "APDU <<"
        );
        Ok(response)
    }

    /// Select the JPN application. SW1 `61` is followed by GET RESPONSE;
    /// anything other than `90`/`61` aborts the scan.
    pub fn select_application(&mut self) -> Result<()> {
        let response = self.transmit(&apdu::SELECT_APDU)?;

        match response.sw1 {
            SW1_SUCCESS => Ok(()),
            SW1_MORE_DATA => {
                self.transmit(&apdu::GET_RESPONSE_APDU)?;
                Ok(())
            }
            sw1 => Err(ScanError::ApplicationSelectionFailed {
                sw1,
                sw2: response.sw2,
            }),
        }
    }

    /// Read one chunk of at most [`CHUNK_SIZE`] bytes: SET LENGTH, SELECT
    /// FILE, then GET DATA. Only the GET DATA payload is used.
    pub fn read_chunk(&mut self, file_no: u16, offset: u16, length: u16) -> Result<Vec<u8>> {
        if length > CHUNK_SIZE {
            return Err(ScanError::Unexpected(format!(
                "Chunk of {} bytes exceeds the {} byte transport limit",
                length, CHUNK_SIZE
            )));
        }

        self.transmit(&apdu::set_length(length))?;
        self.transmit(&apdu::select_file(file_no, offset, length))?;
        let response = self.transmit(&apdu::get_data(length))?;

        if !response.is_success() {
            warn!(
                file_no,
                offset,
                sw = %format!("{:04X}", response.status_word()),
                "GET DATA returned a non-success status word, keeping payload"
            );
        }
        if response.data.len() != usize::from(length) {
            debug!(
                file_no,
                offset,
                expected = length,
                actual = response.data.len(),
                "Short GET DATA payload"
            );
        }

        Ok(response.data)
    }

    /// Read `[offset, offset + length)` of a file in transport-sized chunks,
    /// concatenated in order.
    pub fn read_range(&mut self, file_no: u16, offset: u16, length: u16) -> Result<Vec<u8>> {
        if offset.checked_add(length).is_none() {
            return Err(ScanError::Unexpected(format!(
                "Range {}+{} overflows file {} addressing",
                offset, length, file_no
            )));
        }

        let mut data = Vec::with_capacity(usize::from(length));
        for (chunk_offset, chunk_len) in apdu::chunks(length) {
            data.extend(self.read_chunk(file_no, offset + chunk_offset, chunk_len)?);
        }
        Ok(data)
    }

    /// Read a whole file using its declared length.
    pub fn read_file(&mut self, file_no: u16) -> Result<Vec<u8>> {
        self.read_range(file_no, 0, apdu::file_length(file_no))
    }

    /// Release the card. Safe to call repeatedly; failures are logged and
    /// never returned.
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            match channel.disconnect() {
                Ok(()) => debug!(reader = %self.reader, "Card disconnected"),
                Err(e) => warn!(reader = %self.reader, error = %e, "Card disconnect failed"),
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::{GET_RESPONSE_APDU, SELECT_APDU};
    use crate::mock::{MockCard, MockContext, MOCK_READER};

    #[test]
    fn no_reader_fails_without_connecting() {
        let ctx = MockContext::without_readers();
        let err = Session::open(&ctx).err().unwrap();
        assert!(matches!(err, ScanError::NoReaderFound));
        assert!(ctx.log().connects.is_empty());
    }

    #[test]
    fn first_reader_wins() {
        let ctx = MockContext::new(MockCard::new())
            .with_readers(vec!["Reader A".to_string(), "Reader B".to_string()]);
        let session = Session::open(&ctx).unwrap();
        assert_eq!(session.reader(), "Reader A");
        assert_eq!(ctx.log().connects, vec!["Reader A".to_string()]);
    }

    #[test]
    fn select_success_sends_single_command() {
        let ctx = MockContext::new(MockCard::new());
        let mut session = Session::open(&ctx).unwrap();
        session.select_application().unwrap();
        assert_eq!(ctx.log().sent, vec![SELECT_APDU.to_vec()]);
    }

    #[test]
    fn select_more_data_issues_get_response() {
        let ctx = MockContext::new(MockCard::new().with_select_status(0x61, 0x05));
        let mut session = Session::open(&ctx).unwrap();
        session.select_application().unwrap();
        assert_eq!(
            ctx.log().sent,
            vec![SELECT_APDU.to_vec(), GET_RESPONSE_APDU.to_vec()]
        );
    }

    #[test]
    fn select_rejects_other_status_words() {
        let ctx = MockContext::new(MockCard::new().with_select_status(0x6A, 0x82));
        let mut session = Session::open(&ctx).unwrap();
        let err = session.select_application().unwrap_err();
        assert!(matches!(
            err,
            ScanError::ApplicationSelectionFailed { sw1: 0x6A, sw2: 0x82 }
        ));
        assert_eq!(ctx.log().sent.len(), 1);
    }

    #[test]
    fn read_chunk_uses_three_step_exchange() {
        let file: Vec<u8> = (0..=255u8).collect();
        let ctx = MockContext::new(MockCard::new().with_file(4, file));
        let mut session = Session::open(&ctx).unwrap();

        let data = session.read_chunk(4, 0x10, 8).unwrap();
        assert_eq!(data, (0x10..0x18u8).collect::<Vec<_>>());

        let sent = ctx.log().sent;
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], apdu::set_length(8));
        assert_eq!(sent[1], apdu::select_file(4, 0x10, 8));
        assert_eq!(sent[2], apdu::get_data(8));
    }

    #[test]
    fn read_chunk_rejects_oversized_length() {
        let ctx = MockContext::new(MockCard::new());
        let mut session = Session::open(&ctx).unwrap();
        assert!(session.read_chunk(1, 0, 253).is_err());
        assert!(ctx.log().sent.is_empty());
    }

    #[test]
    fn get_data_status_is_not_enforced() {
        let ctx = MockContext::new(
            MockCard::new()
                .with_file(1, vec![0xAA; 16])
                .with_get_data_status(0x6C, 0x10),
        );
        let mut session = Session::open(&ctx).unwrap();
        assert_eq!(session.read_chunk(1, 0, 4).unwrap(), vec![0xAA; 4]);
    }

    #[test]
    fn read_file_walks_chunk_boundaries() {
        let file: Vec<u8> = (0..459u32).map(|i| (i % 251) as u8).collect();
        let ctx = MockContext::new(MockCard::new().with_file(1, file.clone()));
        let mut session = Session::open(&ctx).unwrap();

        assert_eq!(session.read_file(1).unwrap(), file);

        let sent = ctx.log().sent;
        assert_eq!(sent.len(), 6);
        assert_eq!(sent[1], apdu::select_file(1, 0, 252));
        assert_eq!(sent[4], apdu::select_file(1, 252, 207));
    }

    #[test]
    fn read_range_rejects_overflow() {
        let ctx = MockContext::new(MockCard::new());
        let mut session = Session::open(&ctx).unwrap();
        assert!(session.read_range(1, u16::MAX, 2).is_err());
    }

    #[test]
    fn close_is_idempotent_and_drop_does_not_repeat_it() {
        let ctx = MockContext::new(MockCard::new());
        let mut session = Session::open(&ctx).unwrap();
        session.close();
        session.close();
        drop(session);
        assert_eq!(ctx.log().disconnects, 1);
    }

    #[test]
    fn transmit_after_close_is_an_error() {
        let ctx = MockContext::new(MockCard::new());
        let mut session = Session::open(&ctx).unwrap();
        session.close();
        assert!(matches!(
            session.select_application(),
            Err(ScanError::Unexpected(_))
        ));
    }

    #[test]
    fn disconnect_failure_is_swallowed() {
        let ctx = MockContext::new(MockCard::new().with_disconnect_error(pcsc::Error::ResetCard));
        let mut session = Session::open(&ctx).unwrap();
        session.close();
        assert_eq!(ctx.log().disconnects, 1);
        assert_eq!(ctx.log().connects, vec![MOCK_READER.to_string()]);
    }
}
