use crate::transport::CardChannel;
use crate::types::TransmitResult;
use crate::{Result, ScanError};
use pcsc::{Disposition, MAX_BUFFER_SIZE};
use tracing::debug;

/// PC/SC card connection. Disconnecting consumes the inner handle, so later
/// calls find nothing to release.
pub struct PcscCard {
    inner: Option<pcsc::Card>,
}

impl PcscCard {
    pub fn new(card: pcsc::Card) -> Self {
        Self { inner: Some(card) }
    }
}

impl CardChannel for PcscCard {
    fn transmit(&mut self, command: &[u8]) -> Result<TransmitResult> {
        let card = self
            .inner
            .as_ref()
            .ok_or_else(|| ScanError::Unexpected("Card already disconnected".to_string()))?;

        let mut response = [0u8; MAX_BUFFER_SIZE];
        let response_data = card.transmit(command, &mut response)?;

        Ok(TransmitResult::from_raw(response_data))
    }

    fn disconnect(&mut self) -> Result<()> {
        match self.inner.take() {
            Some(card) => release(card.disconnect(Disposition::LeaveCard)),
            None => Ok(()),
        }
    }
}

/// A failed `LeaveCard` disconnect hands the card back. Dropping it makes
/// pcsc retry with `ResetCard`, which is what we want once the card state
/// is unknown.
fn release<C>(result: std::result::Result<(), (C, pcsc::Error)>) -> Result<()> {
    result.map_err(|(card, e)| {
        debug!(error = %e, "LeaveCard disconnect failed, resetting card");
        drop(card);
        ScanError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Handle<'a>(&'a Cell<usize>);

    impl Drop for Handle<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn failed_disconnect_drops_returned_handle() {
        let drops = Cell::new(0);
        let err = release(Err((Handle(&drops), pcsc::Error::ResetCard))).unwrap_err();
        assert!(matches!(err, ScanError::CardCommunication(pcsc::Error::ResetCard)));
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn clean_disconnect_is_ok() {
        assert!(release::<()>(Ok(())).is_ok());
    }
}
