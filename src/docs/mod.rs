//! Documentation stages: inspection, entry points, generation, finalizing, publishing

pub mod entry_points;
pub mod finalizer;
pub mod generator;
pub mod manifest;
pub mod publisher;

pub use entry_points::{CompiledPathRewrite, EntryPointResolver, MONOREPO_ENTRY_POINTS};
pub use finalizer::{NOJEKYLL_FILE, finalize};
pub use generator::{GeneratorInvoker, resolve_install_root};
pub use manifest::{
    ExportEntry, ExportsMap, PackageManifest, Preconditions, ProjectLayout, ProjectSnapshot,
};
pub use publisher::{PagesPublisher, PublishConfig, PublishOutcome};
