pub mod pipeline;

pub use pipeline::{AlertEvaluator, PipelineConfig};
