use mykad_reader::apdu::{chunks, CHUNK_SIZE};
use mykad_reader::mock::{MockCard, MockContext};
use mykad_reader::Session;
use proptest::prelude::*;

const FILE_LEN: usize = 4011;

fn file_image() -> Vec<u8> {
    (0..FILE_LEN).map(|i| (i * 7 % 256) as u8).collect()
}

proptest! {
    #[test]
    fn chunks_tile_the_range(total in 0u16..=4096) {
        let mut expected_offset = 0u16;
        for (offset, len) in chunks(total) {
            prop_assert_eq!(offset, expected_offset);
            prop_assert!(len > 0 && len <= CHUNK_SIZE);
            prop_assert_eq!(offset % CHUNK_SIZE, 0);
            expected_offset += len;
        }
        prop_assert_eq!(expected_offset, total);
    }

    #[test]
    fn chunked_read_matches_unchunked_slice(
        (offset, length) in (0usize..FILE_LEN).prop_flat_map(|o| (Just(o), 0..=FILE_LEN - o))
    ) {
        let image = file_image();
        let ctx = MockContext::new(MockCard::new().with_file(2, image.clone()));
        let mut session = Session::open(&ctx).unwrap();

        let data = session.read_range(2, offset as u16, length as u16).unwrap();
        prop_assert_eq!(&data[..], &image[offset..offset + length]);
    }
}
