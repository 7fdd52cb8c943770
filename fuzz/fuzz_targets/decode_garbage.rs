#![no_main]
use libfuzzer_sys::fuzz_target;
use rangecoder::decode;

fuzz_target!(|data: (Vec<u8>, u8, u16)| {
    let (bytes, width, len) = data;
    let width = 1u32 << (width % 4);
    let len = usize::from(len).max(1);
    if let Ok(out) = decode(&bytes, bytes.len() as u64 * 8, width, 1 << 16, len) {
        assert_eq!(out.len(), len);
    }
});
