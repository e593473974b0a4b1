mod cache;
mod generation_log;
mod manifest;
mod store;
mod work_queue;

pub use cache::Cache;
pub use generation_log::{GeneratedFile, GenerationLog};
pub use manifest::{
    DEFAULT_PROJECT_ROOT, DOCUMENTATION_EXTENSIONS, Manifest, ManifestEntry, normalize_path,
};
pub use store::{ProjectStore, StoreError};
pub use work_queue::WorkQueue;
