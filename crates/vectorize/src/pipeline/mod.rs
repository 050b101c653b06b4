pub mod builder;

use tracing::debug;

use crate::{
    algorithms::{frame_median, rasterize, scaled_threshold, Histogram},
    bitmap::PackedBitmap,
    bridge::PathBridge,
    error::Result,
    traits::TracingService,
    types::{FrameView, TracedFrame},
};

/// Per-frame chain: histogram, median, binary raster, packed bitmap, trace.
pub struct FramePipeline<T: TracingService> {
    threshold_ratio: f32,
    bridge: PathBridge<T>,
}

impl FramePipeline<crate::tracer::EdgeTracer> {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }
}

impl<T: TracingService> FramePipeline<T> {
    pub fn new(threshold_ratio: f32, service: T) -> Self {
        Self {
            threshold_ratio,
            bridge: PathBridge::new(service),
        }
    }

    pub fn threshold_ratio(&self) -> f32 {
        self.threshold_ratio
    }

    pub fn service(&self) -> &T {
        self.bridge.service()
    }

    /// Process one single-channel frame.
    ///
    /// `scratch` is the histogram buffer reused across frames; it is fully
    /// overwritten before it is read.
    pub fn process(&self, frame: &FrameView<'_>, scratch: &mut Histogram) -> Result<TracedFrame> {
        let median = frame_median(frame, scratch)?;
        let threshold = scaled_threshold(median, self.threshold_ratio);
        let raster = rasterize(frame, threshold)?;

        debug!(median, threshold, "binarized frame");

        let bitmap = PackedBitmap::pack(&FrameView::from(&raster))?;
        let contours = self.bridge.trace(bitmap)?;

        Ok(TracedFrame {
            median,
            threshold,
            raster,
            contours,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!("Pipeline: threshold ratio {:.2}", self.threshold_ratio)
    }
}
