//! Attachment storage backends.

mod blob;
mod local;
mod memory;
mod r2;

pub use blob::{attachment_nonce, build_attachment_key, BlobStore};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use r2::{R2BlobStore, R2Config};

pub(crate) use r2::parse_config as parse_r2_config;
