use crate::{
    algorithms::histogram::{build_histogram, Histogram},
    error::{Result, VectorizeError},
    types::FrameView,
};

/// Median of a 256-level distribution by cumulative-sum search.
///
/// Returns the first intensity whose running count is strictly greater than
/// `pixel_count / 2`. With an even split between two values this lands on
/// the upper one. Only valid because intensities are quantized; this is not
/// a general-purpose median.
pub fn median(histogram: &Histogram, pixel_count: u64) -> Result<u8> {
    let mid = pixel_count / 2;
    let mut sum = 0u64;

    for (value, &count) in histogram.bins().iter().enumerate() {
        sum += count;
        if sum > mid {
            return Ok(value as u8);
        }
    }

    Err(VectorizeError::MedianUndetermined { pixel_count })
}

/// Fill `scratch` from `frame` and return its median intensity.
pub fn frame_median(frame: &FrameView<'_>, scratch: &mut Histogram) -> Result<u8> {
    build_histogram(frame, scratch)?;
    median(scratch, frame.pixel_count())
}
