#![no_main]
use libfuzzer_sys::fuzz_target;
use zessl::{decode, encode, Padding};

fuzz_target!(|data: &[u8]| {
    for &padding in &[Padding::None, Padding::Exact] {
        let mut encoder = encode::Encoder::with_padding(padding);
        let mut buffer = Vec::with_capacity(2 * data.len() + 40);
        let _ = encoder.into_stream(&mut buffer).encode(data);

        let mut decoder = decode::Decoder::new();
        let mut compare = vec![];
        let result = decoder.into_stream(&mut compare).decode_all(buffer.as_slice());
        assert!(result.status.is_ok(), "{:?}", result.status);
        assert!(data == &*compare);
    }
});
