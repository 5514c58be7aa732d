//! Tenant indices: creation settings, mappings and document writes.

mod bulk;
mod lifecycle;
pub mod mapping;
mod settings;

pub use bulk::BulkIndexer;
pub use lifecycle::IndexManager;
pub use mapping::{FEATURE_ROOT, build_mapping, describe_attributes};
pub use settings::CreateIndexConfiguration;
