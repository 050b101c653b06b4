use crate::{error::Result, types::FrameView};

/// Number of intensity levels in an 8-bit frame.
pub const BUCKETS: usize = 256;

/// Frequency of each 8-bit intensity in one frame.
///
/// Meant to be kept by the caller as a scratch buffer and refilled once per
/// frame; every fill starts from zero, so nothing leaks between frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u64; BUCKETS],
}

impl Histogram {
    pub fn new() -> Self {
        Self { bins: [0; BUCKETS] }
    }

    pub fn from_bins(bins: [u64; BUCKETS]) -> Self {
        Self { bins }
    }

    /// Histogram of a single frame in a fresh buffer.
    pub fn of_frame(frame: &FrameView<'_>) -> Result<Self> {
        let mut histogram = Self::new();
        build_histogram(frame, &mut histogram)?;
        Ok(histogram)
    }

    pub fn bins(&self) -> &[u64; BUCKETS] {
        &self.bins
    }

    pub fn count(&self, value: u8) -> u64 {
        self.bins[value as usize]
    }

    /// Sum of all buckets; equals the pixel count of the source frame.
    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn reset(&mut self) {
        self.bins.fill(0);
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill `histogram` from a single-channel frame.
///
/// The channel check happens before the buffer is touched, so a rejected
/// frame leaves the previous contents in place.
pub fn build_histogram(frame: &FrameView<'_>, histogram: &mut Histogram) -> Result<()> {
    frame.require_single_channel()?;
    histogram.reset();

    for row in frame.rows() {
        for &value in row {
            histogram.bins[value as usize] += 1;
        }
    }

    Ok(())
}
