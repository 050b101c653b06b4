use image::DynamicImage;

use crate::{
    bitmap::PackedBitmap,
    error::Result,
    tracer::path::PathList,
    types::TracedFrame,
};

/// Outcome reported by a tracing service alongside its path list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceStatus {
    Ok,
    Failed(String),
}

/// Result state of one tracing call. Dropping it releases whatever the
/// service allocated for the result.
pub trait TraceState {
    fn status(&self) -> &TraceStatus;

    /// Paths found; only meaningful when the status is `Ok`.
    fn paths(&self) -> &PathList;
}

/// Boundary-tracing algorithm turning a packed bitmap into closed paths.
///
/// One `trace` call per frame. Parameter objects and result states are
/// released by dropping them.
pub trait TracingService {
    type Params;
    type State: TraceState;

    /// Fresh parameter object for one call.
    fn params(&self) -> Self::Params;

    fn trace(&self, bitmap: &PackedBitmap, params: &Self::Params) -> Self::State;
}

/// Pull-based supplier of frames.
pub trait FrameSource {
    /// Next frame, or `None` once the source is closed.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>>;

    /// Human-readable description of this source
    fn description(&self) -> String;
}

/// Consumer of per-frame results, e.g. a preview window or a log.
pub trait FrameSink {
    fn present(&mut self, frame: &DynamicImage, traced: &TracedFrame) -> Result<()>;

    /// Called once after the loop ends with the last frame pulled, if any.
    fn finish(&mut self, _last_frame: Option<&DynamicImage>) -> Result<()> {
        Ok(())
    }
}

impl<F: FrameSource + ?Sized> FrameSource for Box<F> {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        (**self).next_frame()
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

impl<K: FrameSink + ?Sized> FrameSink for Box<K> {
    fn present(&mut self, frame: &DynamicImage, traced: &TracedFrame) -> Result<()> {
        (**self).present(frame, traced)
    }

    fn finish(&mut self, last_frame: Option<&DynamicImage>) -> Result<()> {
        (**self).finish(last_frame)
    }
}
