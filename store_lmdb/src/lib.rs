//! LMDB storage backend for the Rollcall pipeline.
//!
//! Implements all storage traits from `rollcall-store` using the `heed` LMDB
//! bindings. Each logical store maps to one LMDB database within a single
//! environment. Every write commits its own transaction before returning, so
//! an acknowledged write survives a crash.

pub mod environment;
pub mod error;
pub mod meta;
pub mod migration;
pub mod nonce;
pub mod queue;

pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use meta::LmdbMetaStore;
pub use nonce::LmdbNonceStore;
pub use queue::LmdbQueueStore;
