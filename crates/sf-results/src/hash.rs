//! Content-based hashing for sweep IDs.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hash a sweep definition together with the tool version.
///
/// Identical definitions run by the same tool version share an ID.
pub fn compute_sweep_id<T: Serialize>(definition: &T, tool_version: &str) -> String {
    let mut hasher = Sha256::new();

    let definition_json = serde_json::to_string(definition).unwrap_or_default();
    hasher.update(definition_json.as_bytes());

    hasher.update(tool_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
