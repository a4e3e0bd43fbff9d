//! Document model
//!
//! # Architecture
//!
//! The backend stores everything as schema-less documents:
//!
//! ```text
//! Collections (name → documents)
//!   └─→ Documents (field name → Datum)
//! ```
//!
//! A `Document` is a flat map from field names to [`Datum`] values. Nested
//! objects and arrays are representable but the ACL layout only ever uses
//! strings, numbers and booleans.

pub mod datum;

pub use datum::Datum;

use std::collections::HashMap;

/// A schema-less document: field name → value
pub type Document = HashMap<String, Datum>;

/// Name of the identifier field every stored document carries
pub const ID_FIELD: &str = "_id";
