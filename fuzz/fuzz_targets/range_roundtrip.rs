#![no_main]
use libfuzzer_sys::fuzz_target;
use rangecoder::{AdaptationParams, Codec, CodecConfig, Error};

fuzz_target!(|data: (Vec<u8>, u8, u16, u8)| {
    let (input, width, chunk, radius) = data;
    if input.is_empty() {
        return;
    }
    let width = 1u32 << (width % 4);
    let adaptation = AdaptationParams {
        locality_radius: u32::from(radius % 32),
        ..AdaptationParams::default()
    };
    let config = CodecConfig::default()
        .with_symbol_bits(width)
        .with_chunk_symbols(usize::from(chunk).max(1))
        .with_adaptation(adaptation);
    let Ok(codec) = Codec::new(config) else {
        return;
    };

    let encoded = match codec.encode(&input) {
        Ok(encoded) => encoded,
        Err(Error::ResolutionExhausted { .. }) => return,
        Err(e) => panic!("unexpected encode error: {e}"),
    };
    let decoded = codec
        .decode(&encoded.bytes, encoded.bit_count, input.len())
        .unwrap();
    assert_eq!(input, decoded);
});
