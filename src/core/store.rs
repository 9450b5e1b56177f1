use rustc_hash::FxHashMap;
use std::collections::HashMap;
use thiserror::Error;

use crate::schema::value::{StorableData, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),
}

/// One partition of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub key: String,
    content: StorableData,
}

impl Namespace {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            content: StorableData::new(),
        }
    }

    pub fn with_content(mut self, content: StorableData) -> Self {
        self.content = content;
        self
    }

    /// Returns the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.content.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.content.remove(key)
    }

    pub fn to_data(&self) -> StorableData {
        self.content.clone()
    }

    pub fn load(&mut self, data: StorableData) {
        self.content = data;
    }
}

/// The collection of namespaces registered for a live session.
#[derive(Debug, Clone, Default)]
pub struct Storable {
    namespaces: FxHashMap<String, Namespace>,
}

impl Storable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace, replacing any with the same key.
    pub fn add_namespace(&mut self, namespace: Namespace) -> &mut Self {
        self.namespaces.insert(namespace.key.clone(), namespace);
        self
    }

    pub fn get_namespace(&self, key: &str) -> Option<&Namespace> {
        self.namespaces.get(key)
    }

    pub fn get_namespace_mut(&mut self, key: &str) -> Option<&mut Namespace> {
        self.namespaces.get_mut(key)
    }

    pub fn set_namespace(&mut self, key: &str, namespace: Namespace) -> Result<(), StoreError> {
        let slot = self
            .namespaces
            .get_mut(key)
            .ok_or_else(|| StoreError::NamespaceNotFound(key.to_string()))?;
        *slot = namespace;
        Ok(())
    }

    pub fn has_namespace(&self, key: &str) -> bool {
        self.namespaces.contains_key(key)
    }

    /// Namespace keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.namespaces.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&Value> {
        self.namespaces.get(namespace)?.get(key)
    }

    /// Write into a registered namespace and return the previous value.
    pub fn set(
        &mut self,
        namespace: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, StoreError> {
        let ns = self
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()))?;
        Ok(ns.set(key, value))
    }

    pub fn to_data(&self) -> HashMap<String, StorableData> {
        self.namespaces
            .iter()
            .map(|(key, ns)| (key.clone(), ns.to_data()))
            .collect()
    }

    /// Load saved namespaces. Keys with no registered namespace are skipped.
    pub fn load(&mut self, data: HashMap<String, StorableData>) {
        for (key, content) in data {
            match self.namespaces.get_mut(&key) {
                Some(ns) => ns.load(content),
                None => tracing::warn!(namespace = %key, "namespace not registered, skipping"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Storable {
        let mut store = Storable::new();
        store
            .add_namespace(Namespace::new("Flags", "flags"))
            .add_namespace(Namespace::new("Player", "player"));
        store
    }

    #[test]
    fn set_returns_previous_value() {
        let mut store = store();
        assert_eq!(store.set("flags", "met", true).unwrap(), None);
        assert_eq!(store.set("flags", "met", false).unwrap(), Some(Value::Bool(true)));
        assert_eq!(store.get("flags", "met"), Some(&Value::Bool(false)));
    }

    #[test]
    fn set_on_unknown_namespace_fails() {
        let mut store = store();
        assert_eq!(
            store.set("nope", "k", 1),
            Err(StoreError::NamespaceNotFound("nope".to_string()))
        );
        assert!(store.set_namespace("nope", Namespace::new("n", "nope")).is_err());
    }

    #[test]
    fn keys_are_sorted() {
        assert_eq!(store().keys(), vec!["flags", "player"]);
    }

    #[test]
    fn load_skips_unregistered_namespaces() {
        let mut source = store();
        source.set("player", "name", "Ann").unwrap();
        let mut data = source.to_data();
        let mut extra = StorableData::new();
        extra.insert("x".to_string(), Value::Null);
        data.insert("unknown".to_string(), extra);

        let mut target = store();
        target.load(data);
        assert_eq!(target.get("player", "name"), Some(&Value::from("Ann")));
        assert!(!target.has_namespace("unknown"));
    }
}
