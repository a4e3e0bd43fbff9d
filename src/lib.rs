// acl-docstore - ACL storage backend on a schema-less document store
// Buckets of keys mapped to value sets, persisted as documents

#![warn(rust_2018_idioms)]

pub mod acl;
pub mod document;
pub mod store;

// Re-exports for convenience
pub use acl::{AclBackend, BackendConfig, DocumentBackend, Key, Transaction, ValueSet, Values};
pub use document::{Datum, Document};
pub use store::{DocumentStore, Filter, MemoryStore, Update};

/// Backend error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Codec error: {0}")]
        Codec(String),

        #[error("Collection unavailable: {0}")]
        CollectionUnavailable(String),

        #[error("Storage error: {0}")]
        Storage(String),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Serialization error: {0}")]
        SerializationError(String),

        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
