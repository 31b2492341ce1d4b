#![no_main]
use gbalz::compress::decoder::{self, BlockIter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The decoder must never panic, only return errors.
    let _ = decoder::decode(data, true);

    // Every block the iterator yields must fit the declared size.
    if let Ok(iter) = BlockIter::new(data) {
        let size = iter.header().uncompressed_size as usize;
        let mut produced = 0usize;
        for item in iter {
            let Ok((offset, block)) = item else { break };
            assert_eq!(offset, produced);
            produced += block.expanded_len();
            assert!(produced <= size);
        }
    }
});
