use std::io::{self, Write};
use std::path::PathBuf;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use serde::Serialize;
use tracing::info;
use vectorize::{Contour, FrameSink, Result, TracedFrame};

pub const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Tint `background` red inside outer contours but not inside holes, then
/// draw every contour as a closed red polyline.
///
/// Contours are filled in order, so a hole clears the region filled by its
/// outer border and a nested outer border fills again.
pub fn render_overlay(background: &GrayImage, contours: &[Contour]) -> RgbImage {
    let mut mask = GrayImage::new(background.width(), background.height());
    for contour in contours {
        let polygon: Vec<Point<i32>> = contour.points.iter().map(|&[x, y]| Point::new(x, y)).collect();
        // draw_polygon_mut rejects closed rings
        if polygon.len() < 3 || polygon.first() == polygon.last() {
            continue;
        }
        let fill = if contour.is_hole() { Luma([0]) } else { Luma([255]) };
        draw_polygon_mut(&mut mask, &polygon, fill);
    }

    let mut canvas = RgbImage::from_fn(background.width(), background.height(), |x, y| {
        let v = background.get_pixel(x, y)[0];
        if mask.get_pixel(x, y)[0] > 0 {
            Rgb([v / 2 + 128, v / 2, v / 2])
        } else {
            Rgb([v, v, v])
        }
    });
    for contour in contours {
        for (from, to) in contour.edges() {
            draw_line_segment_mut(
                &mut canvas,
                (from[0] as f32, from[1] as f32),
                (to[0] as f32, to[1] as f32),
                CONTOUR_COLOR,
            );
        }
    }
    canvas
}

/// Logs a one-line summary per frame
#[derive(Debug, Default)]
pub struct LogSink {
    frames: u64,
}

impl FrameSink for LogSink {
    fn present(&mut self, _frame: &DynamicImage, traced: &TracedFrame) -> Result<()> {
        self.frames += 1;
        info!(
            frame = self.frames,
            median = traced.median,
            threshold = traced.threshold,
            contours = traced.contours.len(),
            points = traced.point_count(),
            "traced {}x{}",
            traced.width(),
            traced.height()
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct FrameRecord<'a> {
    frame: u64,
    width: u32,
    height: u32,
    median: u8,
    threshold: u8,
    contours: &'a [Contour],
}

/// Writes one JSON object per frame
pub struct JsonLinesSink<W: Write> {
    writer: W,
    frames: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn present(&mut self, _frame: &DynamicImage, traced: &TracedFrame) -> Result<()> {
        self.frames += 1;
        let record = FrameRecord {
            frame: self.frames,
            width: traced.width(),
            height: traced.height(),
            median: traced.median,
            threshold: traced.threshold,
            contours: &traced.contours,
        };
        serde_json::to_writer(&mut self.writer, &record).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self, _last_frame: Option<&DynamicImage>) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Wraps another sink and, when the session ends, saves the last source
/// frame and the last contour overlay.
pub struct PreviewSink<K> {
    inner: K,
    snapshot_path: Option<PathBuf>,
    overlay_path: Option<PathBuf>,
    last_overlay: Option<RgbImage>,
}

impl<K: FrameSink> PreviewSink<K> {
    pub fn new(inner: K) -> Self {
        Self {
            inner,
            snapshot_path: None,
            overlay_path: None,
            last_overlay: None,
        }
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_overlay(mut self, path: impl Into<PathBuf>) -> Self {
        self.overlay_path = Some(path.into());
        self
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }
}

impl<K: FrameSink> FrameSink for PreviewSink<K> {
    fn present(&mut self, frame: &DynamicImage, traced: &TracedFrame) -> Result<()> {
        if self.overlay_path.is_some() {
            self.last_overlay = Some(render_overlay(&frame.to_luma8(), &traced.contours));
        }
        self.inner.present(frame, traced)
    }

    fn finish(&mut self, last_frame: Option<&DynamicImage>) -> Result<()> {
        if let (Some(path), Some(frame)) = (&self.snapshot_path, last_frame) {
            frame.save(path)?;
            info!("Saved last frame to {}", path.display());
        }
        if let (Some(path), Some(overlay)) = (&self.overlay_path, &self.last_overlay) {
            overlay.save(path)?;
            info!("Saved contour overlay to {}", path.display());
        }
        self.inner.finish(last_frame)
    }
}
