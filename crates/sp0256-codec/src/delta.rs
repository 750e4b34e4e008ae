//! Delta coding
//!
//! Sample 0 is stored verbatim; each later byte is the difference to the
//! previous *original* sample, clamped to an i8. Reconstruction clamps to
//! 0..=255, so input with steps wider than ±128 does not survive.

pub fn encode(samples: &[u8]) -> Vec<u8> {
    let Some((&first, _)) = samples.split_first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(samples.len());
    out.push(first);
    for pair in samples.windows(2) {
        let delta = (pair[1] as i16 - pair[0] as i16).clamp(i8::MIN as i16, i8::MAX as i16);
        out.push(delta as i8 as u8);
    }
    out
}

pub fn decode(payload: &[u8]) -> Vec<u8> {
    let Some((&first, rest)) = payload.split_first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(payload.len());
    let mut prev = first as i16;
    out.push(first);
    for &byte in rest {
        prev = (prev + byte as i8 as i16).clamp(0, 255);
        out.push(prev as u8);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_layout() {
        assert_eq!(encode(&[128, 130, 127, 127]), vec![128, 2, 0xFD, 0]);
        assert!(encode(&[]).is_empty());
        assert!(decode(&[]).is_empty());
    }

    #[test]
    fn test_clamped_delta_diverges() {
        // 0 -> 255 is a +255 step; only +127 is stored
        let original = [0u8, 255];
        let payload = encode(&original);
        assert_eq!(payload, vec![0, 127]);
        let restored = decode(&payload);
        assert_eq!(restored, vec![0, 127]);
        assert_ne!(restored, original.to_vec());
    }

    #[test]
    fn test_decode_clamps_to_byte_range() {
        // 250 + 127 saturates at 255, 5 - 128 saturates at 0
        assert_eq!(decode(&[250, 127]), vec![250, 255]);
        assert_eq!(decode(&[5, 0x80]), vec![5, 0]);
    }

    fn bounded_steps() -> impl Strategy<Value = Vec<u8>> {
        (any::<u8>(), prop::collection::vec(-128i16..=127, 0..512)).prop_map(|(start, steps)| {
            let mut out = vec![start];
            let mut cur = start as i16;
            for step in steps {
                cur = (cur + step).clamp(0, 255);
                out.push(cur as u8);
            }
            out
        })
    }

    proptest! {
        #[test]
        fn prop_exact_when_steps_fit(samples in bounded_steps()) {
            prop_assert_eq!(decode(&encode(&samples)), samples);
        }

        #[test]
        fn prop_length_preserved(samples in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode(&encode(&samples)).len(), samples.len());
        }

        #[test]
        fn prop_wide_step_diverges(lo in 0u8..=60, hi in 200u8..=255) {
            // step of at least +140 cannot be represented
            let samples = vec![lo, hi];
            prop_assert_ne!(decode(&encode(&samples)), samples);
        }
    }
}
