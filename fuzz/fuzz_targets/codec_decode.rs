//! Arbitrary payloads through every decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use sp0256_codec::Codec;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let codec = Codec::ALL[selector as usize % Codec::ALL.len()];
    let original_len = payload.len() * 2;
    let decoded = codec.decode(payload, original_len);

    match codec {
        Codec::None => assert_eq!(decoded, payload),
        Codec::FourBit => assert_eq!(decoded.len(), original_len),
        Codec::Delta => assert_eq!(decoded.len(), payload.len()),
        Codec::Rle => assert!(decoded.len() <= payload.len() / 2 * 255),
    }
});
