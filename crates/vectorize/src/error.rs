use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorizeError {
    #[error("Unsupported channel count: expected 1, got {channels}")]
    UnsupportedChannelCount { channels: u8 },

    #[error("Median undetermined for a frame of {pixel_count} pixels")]
    MedianUndetermined { pixel_count: u64 },

    #[error("Tracing failed: {0}")]
    TracingFailed(String),

    #[error("Frame buffer holds {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("Raster is {actual_width}x{actual_height}, frame is {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Unsupported sample format: {0:?}")]
    UnsupportedSampleFormat(image::ColorType),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VectorizeError {
    /// Errors that only spoil the current frame. The frame loop logs and
    /// skips these; anything else ends the loop.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedChannelCount { .. }
                | Self::MedianUndetermined { .. }
                | Self::TracingFailed(_)
                | Self::FrameSize { .. }
                | Self::DimensionMismatch { .. }
                | Self::UnsupportedSampleFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VectorizeError>;
