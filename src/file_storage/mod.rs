//! # Blob Storage
//!
//! Physical payload storage behind an opaque reference.

pub mod backend;
pub mod errors;
pub mod local;
pub mod memory;

pub use backend::BlobStore;
pub use errors::{StorageError, StorageResult};
pub use local::LocalBlobStore;
pub use memory::InMemoryBlobStore;
