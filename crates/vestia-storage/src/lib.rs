//! Vestia Storage Library
//!
//! Durable storage for relayed garment assets: the [`ObjectStore`]
//! abstraction, a local filesystem backend with HMAC-signed expiring URLs,
//! collision-resistant key generation, and the [`StorageRelay`] that moves a
//! processed asset from the remote service into the store.
//!
//! # Storage key format
//!
//! Keys are owner-scoped: `{owner_id}/{timestamp}_{random}.{ext}`. The
//! time component plus random suffix makes keys globally unique, so
//! concurrent pipeline runs never contend on a destination object. Keys must
//! not contain `..` or a leading `/`.

pub mod keys;
pub mod local;
pub mod relay;
pub mod source_gate;
pub mod traits;

// Re-export commonly used types
pub use keys::generate_object_key;
pub use local::LocalStore;
pub use relay::{RelayConfig, RelayError, StorageRelay};
pub use source_gate::validate_source_url;
pub use traits::{ObjectStore, StorageError, StorageResult};
