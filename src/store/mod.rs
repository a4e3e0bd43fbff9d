//! Document store layer
//!
//! # Architecture
//!
//! The ACL backend talks to a schema-less document store through the
//! [`DocumentStore`] trait:
//!
//! ```text
//! DocumentStore
//!   └─→ Collections (created on first write)
//!        └─→ Documents (field name → Datum, `_id` assigned on insert)
//! ```
//!
//! Only the handful of operations the backend contract needs are modelled:
//! filtered reads with projection, multi-document updates with upsert,
//! multi-document deletes, index creation and collection administration.
//!
//! ## Implementation
//!
//! [`MemoryStore`] keeps every collection in process memory and can persist
//! itself to a JSON snapshot file.

pub mod engine;
pub mod filter;
pub mod memory;

pub use engine::{DocumentStore, Projection, Update, UpdateResult};
pub use filter::Filter;
pub use memory::MemoryStore;
