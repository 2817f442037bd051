//! KEK version lifecycle, encrypted key distribution, and version-aware
//! search matching for NeuralLog tenants.
//!
//! The version manager's active pointer is the only shared mutable state in
//! the subsystem; everything else is either pure (see `neurallog-crypto`)
//! or an adapter over external storage.

pub mod blobs;
pub mod error;
pub mod matcher;
pub mod ring;
pub mod version;

pub use blobs::{provision_checked, KekBlob, KekBlobStore, MemoryBlobStore};
pub use error::KekError;
pub use matcher::{index_document, match_tokens, MemoryPostingStore, PostingStore};
pub use ring::KekRing;
pub use version::{KekVersion, KekVersionManager, KekVersionStatus};
