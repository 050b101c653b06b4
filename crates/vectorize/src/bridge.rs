//! Hands a packed bitmap to a tracing service and turns the returned path
//! list into contours.

use tracing::debug;

use crate::{
    bitmap::PackedBitmap,
    error::{Result, VectorizeError},
    tracer::path::{PathList, PathSign},
    traits::{TraceState, TraceStatus, TracingService},
    types::Contour,
};

pub struct PathBridge<T: TracingService> {
    service: T,
}

impl<T: TracingService> PathBridge<T> {
    pub fn new(service: T) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &T {
        &self.service
    }

    /// Trace `bitmap` once and collect one contour per path.
    ///
    /// The result state, the parameter object and the bitmap are released in
    /// that order whether or not tracing succeeds. A failed trace is not
    /// retried.
    pub fn trace(&self, mut bitmap: PackedBitmap) -> Result<Vec<Contour>> {
        let params = self.service.params();
        let state = self.service.trace(&bitmap, &params);

        let result = match state.status() {
            TraceStatus::Ok => Ok(collect_contours(state.paths(), bitmap.height())),
            TraceStatus::Failed(reason) => Err(VectorizeError::TracingFailed(reason.clone())),
        };

        drop(state);
        drop(params);
        bitmap.release();

        if let Ok(contours) = &result {
            debug!(contours = contours.len(), "bridged path list");
        }
        result
    }
}

/// Terminal point of every segment, path by path, mapped back to raster
/// coordinates (`y` flipped against `height`). Control points are ignored;
/// negative paths become hole contours.
pub fn collect_contours(paths: &PathList, height: usize) -> Vec<Contour> {
    let height = height as i32;
    paths
        .iter()
        .map(|path| {
            let points = path
                .terminal_points()
                .map(|p| [p.x.round() as i32, height - p.y.round() as i32])
                .collect();
            match path.sign {
                PathSign::Positive => Contour::new(points),
                PathSign::Negative => Contour::hole(points),
            }
        })
        .collect()
}
