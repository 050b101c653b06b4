use image::GrayImage;

use crate::{
    error::{Result, VectorizeError},
    types::FrameView,
};

pub const BLACK: u8 = 0;
pub const WHITE: u8 = 255;

/// Median scaled by `ratio`, rounded and clamped into the 8-bit range.
pub fn scaled_threshold(median: u8, ratio: f32) -> u8 {
    (median as f32 * ratio).round().clamp(0.0, 255.0) as u8
}

/// Binarize `frame` into `output`: intensity above `threshold` becomes
/// white, everything else black.
pub fn rasterize_into(frame: &FrameView<'_>, threshold: u8, output: &mut GrayImage) -> Result<()> {
    frame.require_single_channel()?;
    if output.dimensions() != (frame.width(), frame.height()) {
        return Err(VectorizeError::DimensionMismatch {
            width: frame.width(),
            height: frame.height(),
            actual_width: output.width(),
            actual_height: output.height(),
        });
    }

    let samples = frame.rows().flatten();
    for (out, &value) in output.iter_mut().zip(samples) {
        *out = if value > threshold { WHITE } else { BLACK };
    }

    Ok(())
}

pub fn rasterize(frame: &FrameView<'_>, threshold: u8) -> Result<GrayImage> {
    let mut output = GrayImage::new(frame.width(), frame.height());
    rasterize_into(frame, threshold, &mut output)?;
    Ok(output)
}
