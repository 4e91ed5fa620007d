//! Cache key derivation.
//!
//! A key is `"<operation>:<arguments as canonical JSON>"`. Object keys are sorted at
//! every depth, so two argument values that serialize to the same JSON object share a
//! key no matter which order their fields were written in.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive<A>(operation: &str, args: &A) -> Result<Self, serde_json::Error>
    where
        A: Serialize + ?Sized,
    {
        let value = canonicalize(serde_json::to_value(args)?);
        let encoded = serde_json::to_string(&value)?;
        Ok(Self(format!("{operation}:{encoded}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The operation half of the key.
    pub fn operation(&self) -> &str {
        self.0.split_once(':').map_or(&self.0, |(op, _)| op)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_order_does_not_change_the_key() {
        let a = CacheKey::derive("posts", &json!({"page": 2, "limit": 12, "nested": {"b": 1, "a": 2}}))
            .expect("key");
        let b = CacheKey::derive("posts", &json!({"nested": {"a": 2, "b": 1}, "limit": 12, "page": 2}))
            .expect("key");
        assert_eq!(a, b);
        assert_eq!(
            a.as_str(),
            r#"posts:{"limit":12,"nested":{"a":2,"b":1},"page":2}"#
        );
    }

    #[test]
    fn operation_name_separates_identical_arguments() {
        let args = json!({"limit": 6});
        let featured = CacheKey::derive("featured", &args).expect("key");
        let posts = CacheKey::derive("posts", &args).expect("key");
        assert_ne!(featured, posts);
        assert_eq!(featured.operation(), "featured");
    }

    #[test]
    fn unit_and_scalar_arguments_are_supported() {
        assert_eq!(CacheKey::derive("tags", &()).expect("key").as_str(), "tags:null");
        assert_eq!(
            CacheKey::derive("post", "hello-world").expect("key").as_str(),
            r#"post:"hello-world""#
        );
    }
}
