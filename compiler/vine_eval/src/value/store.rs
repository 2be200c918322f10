//! Ordered key/value container behind objects and module exports.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::Value;
use crate::environment::{MountScope, ScopeError};

/// Key of the prototype slot. Never listed, rendered or iterated.
pub const PROTO_KEY: &str = "__proto__";

/// Prototype hops followed before a lookup gives up.
const MAX_PROTO_DEPTH: usize = 64;

#[derive(Default)]
struct StoreInner {
    entries: Vec<(Arc<str>, Value)>,
    index: FxHashMap<Arc<str>, usize>,
}

impl StoreInner {
    fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    fn insert(&mut self, key: &str, value: Value) {
        if let Some(&i) = self.index.get(key) {
            self.entries[i].1 = value;
        } else {
            let key: Arc<str> = Arc::from(key);
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
        }
    }
}

/// Shared, internally locked object storage.
///
/// Cloning a `Store` clones the handle, not the contents. Entries keep
/// insertion order.
#[derive(Clone, Default)]
pub struct Store(Arc<RwLock<StoreInner>>);

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new key. Fails if the key already exists.
    pub fn define(&self, key: &str, value: Value) -> Result<(), ScopeError> {
        let mut inner = self.0.write();
        if inner.index.contains_key(key) {
            return Err(ScopeError::AlreadyDeclared);
        }
        inner.insert(key, value);
        Ok(())
    }

    /// Insert or overwrite a key.
    pub fn set(&self, key: &str, value: Value) {
        self.0.write().insert(key, value);
    }

    /// Look up a key, falling back through the `__proto__` chain.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut current = self.clone();
        for _ in 0..MAX_PROTO_DEPTH {
            let proto = {
                let inner = current.0.read();
                if let Some(value) = inner.get(key) {
                    return Some(value.clone());
                }
                match inner.get(PROTO_KEY) {
                    Some(Value::Object(proto)) => proto.clone(),
                    _ => return None,
                }
            };
            current = proto;
        }
        None
    }

    /// Look up a key on this store only.
    pub fn get_own(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.read().index.contains_key(key)
    }

    pub fn delete(&self, key: &str) -> Option<Value> {
        let mut inner = self.0.write();
        let pos = inner.index.remove(key)?;
        let (_, value) = inner.entries.remove(pos);
        for slot in inner.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Visible keys in insertion order.
    pub fn keys(&self) -> Vec<Arc<str>> {
        self.0
            .read()
            .entries
            .iter()
            .filter(|(k, _)| &**k != PROTO_KEY)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Visible entries in insertion order.
    pub fn entries(&self) -> Vec<(Arc<str>, Value)> {
        self.0
            .read()
            .entries
            .iter()
            .filter(|(k, _)| &**k != PROTO_KEY)
            .cloned()
            .collect()
    }

    /// Number of visible entries.
    pub fn len(&self) -> usize {
        let inner = self.0.read();
        inner.entries.len() - usize::from(inner.index.contains_key(PROTO_KEY))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl MountScope for Store {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    fn assign(&self, name: &str, value: Value) -> Result<(), ScopeError> {
        self.set(name, value);
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}
