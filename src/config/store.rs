//! Durable-store backend selection (§4.7 / §10.3).

use super::defaults::default_store_backend;
use serde::{Deserialize, Serialize};

/// Durable snapshot store configuration. Only an in-memory backend ships with
/// this crate; the field exists so a future backend (e.g. a key-value
/// service) can be selected without changing the `Config` shape.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
        }
    }
}
