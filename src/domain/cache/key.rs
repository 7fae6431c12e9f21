//! Content-addressed cache key generation

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Trait for generating cache keys from request components
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Generates a cache key from the given components
    fn generate(&self, params: &CacheKeyParams) -> String;

    /// Generates a key with a namespace prefix
    fn generate_with_namespace(&self, namespace: &str, params: &CacheKeyParams) -> String {
        format!("{}:{}", namespace, self.generate(params))
    }
}

/// Components of a cache key
///
/// Components live in a `BTreeMap`, so the canonical JSON form always has
/// its keys sorted regardless of insertion order.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyParams {
    pub components: BTreeMap<String, Value>,
}

impl CacheKeyParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Canonical JSON object with sorted keys and no whitespace
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(&self.components).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Key generator producing the hex SHA-256 digest of the canonical JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256KeyGenerator;

impl Sha256KeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CacheKeyGenerator for Sha256KeyGenerator {
    fn generate(&self, params: &CacheKeyParams) -> String {
        let digest = Sha256::digest(params.canonical_json().as_bytes());
        hex::encode(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_json_sorts_keys() {
        let params = CacheKeyParams::new()
            .with_component("query", "flu symptoms")
            .with_component("mode", "quick");

        assert_eq!(
            params.canonical_json(),
            r#"{"mode":"quick","query":"flu symptoms"}"#
        );
    }

    #[test]
    fn test_sha256_key() {
        let params = CacheKeyParams::new()
            .with_component("mode", "quick")
            .with_component("query", "flu symptoms");

        let key = Sha256KeyGenerator::new().generate(&params);
        assert_eq!(
            key,
            "58b583b690662ace21ae8efea1125b3b6590c59b7e33037b9a255cf161c16dff"
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let generator = Sha256KeyGenerator::new();
        let a = CacheKeyParams::new()
            .with_component("zebra", "z")
            .with_component("apple", 1);
        let b = CacheKeyParams::new()
            .with_component("apple", 1)
            .with_component("zebra", "z");

        assert_eq!(generator.generate(&a), generator.generate(&b));
    }

    #[test]
    fn test_different_components_produce_different_keys() {
        let generator = Sha256KeyGenerator::new();
        let quick = CacheKeyParams::new().with_component("mode", "quick");
        let expert = CacheKeyParams::new().with_component("mode", "expert");

        assert_ne!(generator.generate(&quick), generator.generate(&expert));
    }

    #[test]
    fn test_generate_with_namespace() {
        let generator = Sha256KeyGenerator::new();
        let params = CacheKeyParams::new().with_component("query", "x");

        let key = generator.generate_with_namespace("medical_ai:ai", &params);
        assert!(key.starts_with("medical_ai:ai:"));
        assert_eq!(key.len(), "medical_ai:ai:".len() + 64);
    }
}
