//! Deterministic cache key derivation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A fixed-length (64 hex chars) SHA-256 digest identifying one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Start deriving a key for the operation with the given qualified name.
    pub fn for_operation(operation: impl Into<String>) -> CacheKeyBuilder {
        CacheKeyBuilder {
            operation: operation.into(),
            positional: Vec::new(),
            named: BTreeMap::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collects the stringified arguments of a call.
///
/// Positional arguments keep their order; named arguments are sorted by
/// name, so insertion order never matters.
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    operation: String,
    positional: Vec<String>,
    named: BTreeMap<String, String>,
}

impl CacheKeyBuilder {
    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.positional.push(value.to_string());
        self
    }

    /// Set a named argument. Setting the same name twice keeps the last value.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.named.insert(name.into(), value.to_string());
        self
    }

    /// Hash the operation name and arguments into a key.
    ///
    /// Every part is hashed as a kind tag followed by its length-prefixed
    /// bytes, so neither separators inside values nor a positional argument
    /// spelled like `name:value` can collide with another call.
    pub fn finish(self) -> CacheKey {
        let mut hasher = Sha256::new();
        hash_part(&mut hasher, PartKind::Operation, &self.operation);
        for value in &self.positional {
            hash_part(&mut hasher, PartKind::Positional, value);
        }
        for (name, value) in &self.named {
            hash_part(&mut hasher, PartKind::Name, name);
            hash_part(&mut hasher, PartKind::Value, value);
        }
        CacheKey(format!("{:x}", hasher.finalize()))
    }
}

#[derive(Clone, Copy)]
#[repr(u8)]
enum PartKind {
    Operation = 0,
    Positional = 1,
    Name = 2,
    Value = 3,
}

fn hash_part(hasher: &mut Sha256, kind: PartKind, part: &str) {
    hasher.update([kind as u8]);
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_fixed_length_hex() {
        let key = CacheKey::for_operation("qa").arg("vid").finish();
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(key.short().len(), 8);
    }

    #[test]
    fn test_named_argument_order_is_irrelevant() {
        let a = CacheKey::for_operation("quiz")
            .arg("vid-1")
            .named("regenerate", false)
            .named("count", 5)
            .finish();
        let b = CacheKey::for_operation("quiz")
            .arg("vid-1")
            .named("count", 5)
            .named("regenerate", false)
            .finish();
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_difference_changes_the_key() {
        let base = || CacheKey::for_operation("navigate").arg("vid").arg("intro");
        let key = base().finish();
        assert_ne!(key, base().arg("extra").finish());
        assert_ne!(key, CacheKey::for_operation("answer").arg("vid").arg("intro").finish());
        assert_ne!(key, CacheKey::for_operation("navigate").arg("intro").arg("vid").finish());
        assert_ne!(key, base().named("k", 3).finish());
        assert_ne!(
            base().named("k", 3).finish(),
            base().named("k", 4).finish()
        );
    }

    #[test]
    fn test_separators_inside_values_do_not_collide() {
        let joined = CacheKey::for_operation("op").arg("a:b").finish();
        let split = CacheKey::for_operation("op").arg("a").arg("b").finish();
        assert_ne!(joined, split);
    }

    #[test]
    fn test_positional_never_collides_with_named() {
        let positional = CacheKey::for_operation("op").arg("k:3").finish();
        let named = CacheKey::for_operation("op").named("k", 3).finish();
        assert_ne!(positional, named);
    }
}
