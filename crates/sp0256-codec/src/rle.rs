//! Run-length encoding
//!
//! Output is a flat list of (value, count) byte pairs. Runs longer than
//! 255 are split.

pub fn encode(samples: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut iter = samples.iter().copied();
    let Some(mut value) = iter.next() else {
        return out;
    };
    let mut count: u8 = 1;

    for sample in iter {
        if sample == value && count < u8::MAX {
            count += 1;
        } else {
            out.push(value);
            out.push(count);
            value = sample;
            count = 1;
        }
    }
    out.push(value);
    out.push(count);
    out
}

/// Expand pairs; a dangling final byte is ignored
pub fn decode(payload: &[u8]) -> Vec<u8> {
    let total: usize = payload.chunks_exact(2).map(|p| p[1] as usize).sum();
    let mut out = Vec::with_capacity(total);
    for pair in payload.chunks_exact(2) {
        out.extend(std::iter::repeat(pair[0]).take(pair[1] as usize));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_pairs() {
        assert_eq!(encode(&[128; 5]), vec![128, 5]);
        assert_eq!(encode(&[0, 0, 255]), vec![0, 2, 255, 1]);
        assert!(encode(&[]).is_empty());
    }

    #[test]
    fn test_long_run_split() {
        let samples = vec![7u8; 600];
        assert_eq!(encode(&samples), vec![7, 255, 7, 255, 7, 90]);
        assert_eq!(decode(&encode(&samples)), samples);
    }

    #[test]
    fn test_decode_edge_cases() {
        assert_eq!(decode(&[9, 0, 1, 2]), vec![1, 1]);
        assert_eq!(decode(&[5, 2, 77]), vec![5, 5]);
        assert!(decode(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_roundtrip(samples in prop::collection::vec(any::<u8>(), 0..2048)) {
            prop_assert_eq!(decode(&encode(&samples)), samples);
        }

        #[test]
        fn prop_roundtrip_runs(runs in prop::collection::vec((any::<u8>(), 1usize..700), 0..8)) {
            let samples: Vec<u8> = runs
                .iter()
                .flat_map(|&(v, n)| std::iter::repeat(v).take(n))
                .collect();
            prop_assert_eq!(decode(&encode(&samples)), samples);
        }
    }
}
