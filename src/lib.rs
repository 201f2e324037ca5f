//! docs-publisher
//!
//! Generates API documentation for a TypeScript package or workspace with an
//! external generator and publishes the output to a static hosting branch.

pub mod core;
pub mod docs;
pub mod orchestration;
pub mod security;

pub use self::core::*;
pub use docs::{
    EntryPointResolver, GeneratorInvoker, PackageManifest, PagesPublisher, Preconditions,
    ProjectLayout, ProjectSnapshot, PublishConfig, PublishOutcome, finalize,
    resolve_install_root,
};
pub use orchestration::{
    DocsPipeline, PipelineContext, PipelineReport, PipelineStep, StepReport, StepStatus,
};
pub use security::{CommandError, SafeCommandExecutor, SecureTokenManager};
