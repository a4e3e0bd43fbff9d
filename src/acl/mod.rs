//! ACL backend on top of a document store
//!
//! # Layout
//!
//! Buckets hold keys, keys hold value sets. Each `(bucket, key)` pair is one
//! document whose member values are stored as boolean fields:
//!
//! ```text
//! acl_users                         (per-bucket collections)
//!   └─→ { _id, key: "joe", admin: true, editor: true }
//!
//! acl_resources                     (single shared collection)
//!   └─→ { _id, _bucketname: "users", key: "joe", admin: true }
//! ```
//!
//! Keys and values are percent-encoded before they become field names or
//! field values (see [`codec`]), so identifiers containing `.` or other
//! characters illegal in field names round-trip unchanged.
//!
//! # Transactions
//!
//! Mutations never touch the store directly. [`AclBackend::add`],
//! [`AclBackend::remove`] and [`AclBackend::del`] validate their arguments
//! and append typed steps to a [`Transaction`]; [`AclBackend::end`] runs the
//! steps in order and stops at the first failure.

pub mod backend;
pub mod codec;
pub mod config;
pub mod resolver;
pub mod transaction;
pub mod types;

pub use backend::{AclBackend, DocumentBackend};
pub use config::BackendConfig;
pub use resolver::{CollectionResolver, ResolvedCollection};
pub use transaction::{Step, Transaction, TransactionState};
pub use types::{Key, ValueSet, Values};

pub use crate::document::ID_FIELD;

/// Field holding the encoded key of a document
pub const KEY_FIELD: &str = "key";

/// Discriminator field used when all buckets share one collection
pub const BUCKET_FIELD: &str = "_bucketname";

/// Collection name (before prefixing) shared by all buckets in single-collection mode
pub const SHARED_COLLECTION: &str = "resources";

/// Fields that never count as set members
pub const RESERVED_FIELDS: [&str; 3] = [KEY_FIELD, ID_FIELD, BUCKET_FIELD];
