pub mod catalog;

pub use catalog::{pipeline_key, DrawMode, PipelineCatalog, PipelineSpec};
