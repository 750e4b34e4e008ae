//! Waveform - immutable 8-bit PCM buffer for one allophone

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

/// Fixed playback rate of every waveform
pub const SAMPLE_RATE_HZ: u32 = 11_025;

/// Mid-scale sample value (silence)
pub const MID_SCALE: u8 = 0x80;

/// Unsigned 8-bit PCM samples centered at 128
///
/// Backed by [`Bytes`], so clones share the buffer.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Waveform {
    samples: Bytes,
}

impl Waveform {
    pub fn new(samples: impl Into<Bytes>) -> Self {
        Waveform {
            samples: samples.into(),
        }
    }

    /// `len` samples of mid-scale silence
    pub fn silence(len: usize) -> Self {
        Waveform::new(vec![MID_SCALE; len])
    }

    #[inline]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration at [`SAMPLE_RATE_HZ`]
    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.len() as u64 * 1_000_000 / SAMPLE_RATE_HZ as u64)
    }

    /// Whole milliseconds, as printed in playback logs
    pub fn duration_ms(&self) -> u64 {
        self.len() as u64 * 1000 / SAMPLE_RATE_HZ as u64
    }
}

impl From<Vec<u8>> for Waveform {
    fn from(samples: Vec<u8>) -> Self {
        Waveform::new(samples)
    }
}

impl From<&[u8]> for Waveform {
    fn from(samples: &[u8]) -> Self {
        Waveform::new(Bytes::copy_from_slice(samples))
    }
}

impl AsRef<[u8]> for Waveform {
    fn as_ref(&self) -> &[u8] {
        self.samples()
    }
}

impl fmt::Debug for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Waveform({} samples, ~{}ms)", self.len(), self.duration_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence() {
        let wf = Waveform::silence(200);
        assert_eq!(wf.len(), 200);
        assert!(wf.samples().iter().all(|&s| s == MID_SCALE));
        assert_eq!(wf.duration_ms(), 18);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let wf = Waveform::from(vec![1u8, 2, 3]);
        let copy = wf.clone();
        assert_eq!(wf.samples().as_ptr(), copy.samples().as_ptr());
        assert_eq!(copy, wf);
    }

    #[test]
    fn test_duration() {
        let wf = Waveform::silence(SAMPLE_RATE_HZ as usize);
        assert_eq!(wf.duration(), Duration::from_secs(1));
        assert!(Waveform::default().is_empty());
    }
}
