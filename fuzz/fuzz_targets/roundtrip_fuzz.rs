#![no_main]
use gbalz::compress::decoder;
use gbalz::compress::encoder::{self, EncodeOptions};
use gbalz::format::header::Mode;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, payload)) = data.split_first() else {
        return;
    };
    let mode = if flags & 1 != 0 { Mode::Lz11 } else { Mode::Lz10 };
    let vram_safe = flags & 2 != 0;

    let packed = encoder::encode(payload, EncodeOptions::new(mode, vram_safe))
        .expect("fuzz input fits the size field");
    assert_eq!(packed.len() % 4, 0);

    let decoded = decoder::decode_with_report(&packed, Some(mode), vram_safe)
        .expect("encoder output must decode");
    assert_eq!(decoded.data, payload);
    assert!(decoded.warnings.is_empty());
});
