//! # Frame Vectorization Library
//!
//! Turns grayscale video frames into vector contours. Each frame is
//! binarized against its own median intensity, packed into a word-aligned
//! bitmap and handed to a boundary tracer; the tracer's paths come back as
//! closed integer polygons ready to be drawn over a preview.
//!
//! ## Core Features
//!
//! - **Adaptive threshold**: 256-bucket histogram median, optionally scaled
//! - **Packed bitmaps**: one bit per pixel, MSB first, bottom-up rows
//! - **Pluggable tracing**: any [`TracingService`] can sit behind the bridge
//! - **Frame loop**: pull-based source, push-based sink, coarse stop flag
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vectorize::{FramePipeline, FrameView, Histogram};
//! use image::open;
//!
//! let pipeline = FramePipeline::builder()
//!     .threshold_ratio(1.0)
//!     .build();
//!
//! let image = open("frame.png")?.to_luma8();
//! let mut scratch = Histogram::new();
//! let traced = pipeline.process(&FrameView::from(&image), &mut scratch)?;
//!
//! for contour in &traced.contours {
//!     println!("{} points, area {}", contour.len(), contour.area());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod bitmap;
pub mod tracer;
pub mod bridge;
pub mod pipeline;
pub mod runner;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use error::{VectorizeError, Result};
pub use types::{Contour, ContourKind, FrameView, TracedFrame};
pub use traits::*;
pub use algorithms::*;
pub use bitmap::PackedBitmap;
pub use bridge::PathBridge;
pub use tracer::{ContourMode, EdgeTracer, TraceParams};
pub use pipeline::{FramePipeline, builder::PipelineBuilder};
pub use runner::{FrameLoop, LoopSummary, StopHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn create_test_image() -> GrayImage {
        let mut img = GrayImage::new(100, 100);
        for y in 20..80 {
            for x in 20..80 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        img
    }

    fn scenario_frame() -> GrayImage {
        GrayImage::from_raw(
            4,
            4,
            vec![
                10, 10, 200, 200, //
                10, 10, 200, 200, //
                50, 50, 250, 250, //
                50, 50, 250, 250,
            ],
        )
        .expect("16 samples")
    }

    #[test]
    fn test_pipeline_basic() {
        let pipeline = FramePipeline::builder().build();
        let image = create_test_image();

        let result = pipeline
            .process(&FrameView::from(&image), &mut Histogram::new())
            .expect("Should process successfully");

        // 3600 white of 10000: the median is black, so the square is white
        assert_eq!(result.median, 0);
        assert_eq!(result.contours.len(), 1);
        assert_eq!(result.width(), 100);
        assert_eq!(result.height(), 100);
        // border pixel centers: a 60x60 block spans 59 units each way
        assert_eq!(result.contours[0].bounding_box(), Some(([20, 20], [79, 79])));
        assert_eq!(result.contours[0].area(), 3481.0);
        assert_eq!(result.contours[0].len(), 236);
    }

    #[test]
    fn test_scenario_end_to_end() {
        let image = scenario_frame();
        let pipeline = FramePipeline::builder().build();
        let mut scratch = Histogram::new();

        let traced = pipeline.process(&FrameView::from(&image), &mut scratch).unwrap();

        assert_eq!(scratch.total(), 16);
        assert_eq!(traced.median, 200);
        assert_eq!(traced.threshold, 200);
        assert_eq!(
            traced.raster.as_raw().as_slice(),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 255, 255, 0, 0, 255, 255]
        );
        assert_eq!(traced.contours.len(), 1);

        let mut corners = traced.contours[0].points.clone();
        corners.sort();
        assert_eq!(corners, vec![[2, 2], [2, 3], [3, 2], [3, 3]]);
    }

    #[test]
    fn test_threshold_ratio_moves_the_cut() {
        let image = scenario_frame();
        let pipeline = FramePipeline::builder().threshold_ratio(0.25).build();

        let traced = pipeline.process(&FrameView::from(&image), &mut Histogram::new()).unwrap();

        // 200 * 0.25 = 50: only the 10s stay black
        assert_eq!(traced.threshold, 50);
        assert_eq!(traced.raster.get_pixel(0, 0)[0], 0);
        assert_eq!(traced.raster.get_pixel(0, 2)[0], 0);
        assert_eq!(traced.raster.get_pixel(2, 0)[0], 255);
        assert_eq!(traced.contours.len(), 1);
    }

    #[test]
    fn test_ring_gives_outer_and_hole_contours() {
        let image = GrayImage::from_fn(50, 50, |x, y| {
            let outer = (5..35).contains(&x) && (5..35).contains(&y);
            let inner = (15..25).contains(&x) && (15..25).contains(&y);
            Luma([if outer && !inner { 220 } else { 30 }])
        });
        let pipeline = FramePipeline::builder().build();

        let traced = pipeline.process(&FrameView::from(&image), &mut Histogram::new()).unwrap();

        let shapes: Vec<_> = traced.contours.iter().map(|c| (c.kind, c.area())).collect();
        assert_eq!(shapes, vec![(ContourKind::Outer, 841.0), (ContourKind::Hole, 119.0)]);
        assert_eq!(traced.contours[1].bounding_box(), Some(([14, 14], [25, 25])));

        let outlines = FramePipeline::builder()
            .trace_params(TraceParams {
                mode: ContourMode::External,
                ..TraceParams::default()
            })
            .build()
            .process(&FrameView::from(&image), &mut Histogram::new())
            .unwrap();
        assert_eq!(outlines.contours.len(), 1);
    }

    #[test]
    fn test_multi_channel_frame_is_rejected() {
        let data = vec![0u8; 4 * 4 * 3];
        let frame = FrameView::new(4, 4, 3, &data).unwrap();
        let err = FramePipeline::builder()
            .build()
            .process(&frame, &mut Histogram::new())
            .unwrap_err();
        assert!(matches!(err, VectorizeError::UnsupportedChannelCount { channels: 3 }));
    }

    #[test]
    fn test_uniform_frame_has_no_contours() {
        let image = GrayImage::from_pixel(32, 32, Luma([128u8]));
        let traced = FramePipeline::builder()
            .build()
            .process(&FrameView::from(&image), &mut Histogram::new())
            .unwrap();
        assert!(traced.raster.pixels().all(|p| p[0] == 0));
        assert!(traced.contours.is_empty());
    }
}
