//! Orchestration layer for the documentation pipeline
//!
//! Sequences clean, generate and publish for a single project.

pub mod pipeline;

pub use pipeline::{
    DocsPipeline, PipelineContext, PipelineReport, PipelineStep, StepReport, StepStatus,
};
