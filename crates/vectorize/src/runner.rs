use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::{
    algorithms::Histogram,
    error::Result,
    pipeline::FramePipeline,
    traits::{FrameSink, FrameSource, TracingService},
    types::FrameView,
};

/// Cloneable flag that asks a running [`FrameLoop`] to stop after the
/// current frame.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Frames pulled from the source
    pub frames: u64,
    /// Frames handed to the sink
    pub traced: u64,
    /// Frames dropped because of a per-frame error
    pub skipped: u64,
}

/// Single-threaded frame loop: pull, process, present, repeat.
pub struct FrameLoop<S, K, T>
where
    S: FrameSource,
    K: FrameSink,
    T: TracingService,
{
    source: S,
    sink: K,
    pipeline: FramePipeline<T>,
    stop: StopHandle,
    frame_interval: Option<Duration>,
    max_frames: Option<u64>,
}

impl<S, K, T> FrameLoop<S, K, T>
where
    S: FrameSource,
    K: FrameSink,
    T: TracingService,
{
    pub fn new(source: S, sink: K, pipeline: FramePipeline<T>) -> Self {
        Self {
            source,
            sink,
            pipeline,
            stop: StopHandle::new(),
            frame_interval: None,
            max_frames: None,
        }
    }

    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Wait this long after each frame (the preview's input-polling slice).
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Run until the source closes, the stop flag is raised or the frame
    /// budget is spent. Per-frame failures are logged and skipped; source and
    /// sink errors end the loop.
    pub fn run(&mut self) -> Result<LoopSummary> {
        info!(source = %self.source.description(), "{}", self.pipeline.info());

        let mut scratch = Histogram::new();
        let mut summary = LoopSummary::default();
        let mut last_frame: Option<DynamicImage> = None;

        while !self.stop.is_stopped() && self.max_frames.is_none_or(|max| summary.frames < max) {
            let Some(frame) = self.source.next_frame()? else {
                info!("frame source closed");
                break;
            };
            summary.frames += 1;

            let traced = FrameView::try_from(&frame)
                .and_then(|view| self.pipeline.process(&view, &mut scratch));

            match traced {
                Ok(traced) => {
                    debug!(
                        frame = summary.frames,
                        median = traced.median,
                        contours = traced.contours.len(),
                        "frame traced"
                    );
                    self.sink.present(&frame, &traced)?;
                    summary.traced += 1;
                }
                Err(e) if e.is_frame_local() => {
                    warn!(frame = summary.frames, "skipping frame: {}", e);
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }

            last_frame = Some(frame);

            if let Some(interval) = self.frame_interval {
                thread::sleep(interval);
            }
        }

        self.sink.finish(last_frame.as_ref())?;

        info!(
            frames = summary.frames,
            traced = summary.traced,
            skipped = summary.skipped,
            "frame loop finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorizeError;
    use crate::types::TracedFrame;
    use image::{GrayImage, Luma, RgbImage};
    use std::collections::VecDeque;

    struct QueueSource {
        frames: VecDeque<DynamicImage>,
        fail_when_empty: bool,
    }

    impl QueueSource {
        fn new(frames: Vec<DynamicImage>) -> Self {
            Self {
                frames: frames.into(),
                fail_when_empty: false,
            }
        }
    }

    impl FrameSource for QueueSource {
        fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
            match self.frames.pop_front() {
                Some(frame) => Ok(Some(frame)),
                None if self.fail_when_empty => Err(VectorizeError::Io(std::io::Error::other("device lost"))),
                None => Ok(None),
            }
        }

        fn description(&self) -> String {
            format!("Queue: {} frames", self.frames.len())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        presented: Vec<usize>,
        finished_with: Option<Option<(u32, u32)>>,
        stop_after: Option<(usize, StopHandle)>,
    }

    impl FrameSink for RecordingSink {
        fn present(&mut self, _frame: &DynamicImage, traced: &TracedFrame) -> Result<()> {
            self.presented.push(traced.contours.len());
            if let Some((n, handle)) = &self.stop_after {
                if self.presented.len() >= *n {
                    handle.stop();
                }
            }
            Ok(())
        }

        fn finish(&mut self, last_frame: Option<&DynamicImage>) -> Result<()> {
            self.finished_with = Some(last_frame.map(|f| (f.width(), f.height())));
            Ok(())
        }
    }

    fn square_frame() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(16, 16, |x, y| {
            Luma([if (4..12).contains(&x) && (4..12).contains(&y) { 250 } else { 10 }])
        }))
    }

    fn color_frame() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(16, 16))
    }

    fn empty_frame() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::new(0, 0))
    }

    #[test]
    fn test_runs_until_source_closes() {
        let source = QueueSource::new(vec![square_frame(), square_frame()]);
        let mut frame_loop = FrameLoop::new(source, RecordingSink::default(), FramePipeline::builder().build());

        let summary = frame_loop.run().unwrap();

        assert_eq!(summary, LoopSummary { frames: 2, traced: 2, skipped: 0 });
        assert_eq!(frame_loop.sink().presented, vec![1, 1]);
        assert_eq!(frame_loop.sink().finished_with, Some(Some((16, 16))));
    }

    #[test]
    fn test_bad_frames_are_skipped() {
        let source = QueueSource::new(vec![color_frame(), empty_frame(), square_frame()]);
        let mut frame_loop = FrameLoop::new(source, RecordingSink::default(), FramePipeline::builder().build());

        let summary = frame_loop.run().unwrap();

        assert_eq!(summary, LoopSummary { frames: 3, traced: 1, skipped: 2 });
        assert_eq!(frame_loop.sink().presented, vec![1]);
    }

    #[test]
    fn test_frame_budget() {
        let source = QueueSource::new(vec![square_frame(); 5]);
        let mut frame_loop = FrameLoop::new(source, RecordingSink::default(), FramePipeline::builder().build())
            .with_max_frames(3);

        let summary = frame_loop.run().unwrap();

        assert_eq!(summary.frames, 3);
        let (source, _) = frame_loop.into_parts();
        assert_eq!(source.frames.len(), 2);
    }

    #[test]
    fn test_stop_handle_ends_after_current_frame() {
        let stop = StopHandle::new();
        let sink = RecordingSink {
            stop_after: Some((2, stop.clone())),
            ..RecordingSink::default()
        };
        let source = QueueSource::new(vec![square_frame(); 5]);
        let mut frame_loop =
            FrameLoop::new(source, sink, FramePipeline::builder().build()).with_stop_handle(stop);

        let summary = frame_loop.run().unwrap();

        assert_eq!(summary.traced, 2);
        assert!(frame_loop.stop_handle().is_stopped());
    }

    #[test]
    fn test_source_error_ends_loop() {
        let mut source = QueueSource::new(vec![square_frame()]);
        source.fail_when_empty = true;
        let mut frame_loop = FrameLoop::new(source, RecordingSink::default(), FramePipeline::builder().build());

        let err = frame_loop.run().unwrap_err();

        assert!(matches!(err, VectorizeError::Io(_)));
        assert_eq!(frame_loop.sink().presented, vec![1]);
        assert_eq!(frame_loop.sink().finished_with, None);
    }
}
