//! Backend configuration.
//!
//! # Example
//!
//! ```toml
//! prefix = "acl_"
//! use_single_collection = true
//! # Raw bucket names are used only when this is explicitly `false`
//! use_raw_collection_names = false
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default collection name prefix
pub const DEFAULT_PREFIX: &str = "acl_";

/// Environment variable prefix read by [`BackendConfig::load`]
pub const ENV_PREFIX: &str = "ACL";

/// Options recognised when constructing a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Prepended to every physical collection name
    pub prefix: String,

    /// Store every bucket in one shared collection, told apart by a
    /// `_bucketname` field
    pub use_single_collection: bool,

    /// Collection-name sanitization switch.
    ///
    /// Bucket names are used verbatim only when this is explicitly
    /// `Some(false)`. `None` and `Some(true)` both sanitize. Existing
    /// deployments depend on this mapping, so it is kept as is.
    pub use_raw_collection_names: Option<bool>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            use_single_collection: false,
            use_raw_collection_names: None,
        }
    }
}

impl BackendConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_single_collection(mut self, single: bool) -> Self {
        self.use_single_collection = single;
        self
    }

    pub fn with_raw_collection_names(mut self, flag: bool) -> Self {
        self.use_raw_collection_names = Some(flag);
        self
    }

    /// Whether bucket names bypass sanitization
    pub fn raw_collection_names(&self) -> bool {
        self.use_raw_collection_names == Some(false)
    }

    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Layer an optional config file and `ACL_*` environment variables
    /// over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<BackendConfig>())
            .map_err(|e| Error::Config(e.to_string()))
    }
}
