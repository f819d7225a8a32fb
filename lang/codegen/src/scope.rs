//! Two-level name resolution: frozen globals plus a stack of local frames.

use crate::err::ScopeError;
use indexmap::IndexMap;
use std::{borrow::Borrow, collections::HashMap, hash::Hash, sync::Arc};

#[derive(Clone, Debug)]
pub struct ScopedMap<K, V> {
    globals: Arc<IndexMap<K, V>>,
    frames: Vec<HashMap<K, V>>,
}

impl<K, V> ScopedMap<K, V>
where
    K: Eq + Hash,
{
    /// The globals are fixed from here on.
    pub fn new(globals: IndexMap<K, V>) -> Self {
        ScopedMap { globals: Arc::new(globals), frames: Vec::new() }
    }

    /// An empty frame stack over the same globals.
    pub fn fork(&self) -> Self {
        ScopedMap { globals: self.globals.clone(), frames: Vec::new() }
    }

    pub fn globals(&self) -> &IndexMap<K, V> {
        &self.globals
    }

    pub fn is_global<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.globals.contains_key(k)
    }

    /// Number of open local frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) -> Result<(), ScopeError> {
        self.frames.pop().map(|_| ()).ok_or(ScopeError::Underflow)
    }

    /// Bind in the innermost frame; a rejected binding leaves the map unchanged.
    pub fn bind(&mut self, k: K, v: V) -> Result<(), ScopeError> {
        let frame = self.frames.last_mut().ok_or(ScopeError::NoFrame)?;
        if frame.contains_key(&k) {
            return Err(ScopeError::Duplicate);
        }
        frame.insert(k, v);
        Ok(())
    }

    /// Globals first, then every local frame from the innermost outwards.
    pub fn lookup<Q>(&self, k: &Q) -> Result<&V, ScopeError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(v) = self.globals.get(k) {
            return Ok(v);
        }
        self.frames.iter().rev().find_map(|frame| frame.get(k)).ok_or(ScopeError::Unbound)
    }
}
