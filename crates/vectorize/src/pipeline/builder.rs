use crate::{
    pipeline::FramePipeline,
    tracer::{EdgeTracer, TraceParams},
    traits::TracingService,
};

/// Builder for creating frame pipelines with a fluent API
pub struct PipelineBuilder<T = EdgeTracer> {
    threshold_ratio: f32,
    service: T,
}

impl PipelineBuilder {
    /// Builder with ratio 1.0 and the default edge tracer
    pub fn new() -> Self {
        Self {
            threshold_ratio: 1.0,
            service: EdgeTracer::default(),
        }
    }

    /// Configure the edge tracer
    pub fn trace_params(mut self, params: TraceParams) -> Self {
        self.service = EdgeTracer::new(params);
        self
    }
}

impl<T: TracingService> PipelineBuilder<T> {
    /// Scale applied to the median before thresholding
    pub fn threshold_ratio(mut self, ratio: f32) -> Self {
        self.threshold_ratio = ratio;
        self
    }

    /// Replace the tracing service
    pub fn with_tracer<U: TracingService>(self, service: U) -> PipelineBuilder<U> {
        PipelineBuilder {
            threshold_ratio: self.threshold_ratio,
            service,
        }
    }

    pub fn build(self) -> FramePipeline<T> {
        FramePipeline::new(self.threshold_ratio, self.service)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
