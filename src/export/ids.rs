//! Deterministic identifiers for generated project files.
//!
//! Eclipse wants numeric ids on configurations, tool chains and tools. They
//! are derived from the component name and a purpose string, so exporting
//! the same model twice yields the same ids.

use sha2::{Digest, Sha256};

/// A stable 32-bit id for `(scope, purpose)`.
pub fn stable_id(scope: &str, purpose: &str) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update([0u8]);
    hasher.update(purpose.as_bytes());
    let digest = hasher.finalize();
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// `prefix.<id>`, the shape CDT uses for element ids.
pub fn dotted(prefix: &str, scope: &str, purpose: &str) -> String {
    format!("{}.{}", prefix, stable_id(scope, purpose))
}
