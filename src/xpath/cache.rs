//! Compiled query cache
//!
//! Bounded LRU map from query text to its compiled form, shareable across
//! threads.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::trace;

use super::compiler::{compile_with, CompiledQuery};
use super::eval::evaluate_with;
use crate::dom::{Document, NodeId};
use crate::error::{CompileError, Error};
use crate::options::Options;

/// Default number of compiled queries kept
pub const DEFAULT_CAPACITY: usize = 256;

/// LRU cache of compiled queries
pub struct QueryCache {
    entries: Mutex<LruCache<String, Arc<CompiledQuery>>>,
    options: Options,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl QueryCache {
    /// Create a cache holding up to `capacity` queries (at least one)
    pub fn new(capacity: usize) -> Self {
        Self::with_options(capacity, Options::default())
    }

    pub fn with_options(capacity: usize, options: Options) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        QueryCache {
            entries: Mutex::new(LruCache::new(capacity)),
            options,
        }
    }

    /// A poisoned lock still holds a consistent map
    fn entries(&self) -> MutexGuard<'_, LruCache<String, Arc<CompiledQuery>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached compilation of `query`, compiling it on a miss.
    /// Failed compilations are not cached.
    pub fn get_or_compile(&self, query: &str) -> Result<Arc<CompiledQuery>, CompileError> {
        if let Some(hit) = self.entries().get(query) {
            self.options.observe(|| trace!(query, "query cache hit"));
            return Ok(Arc::clone(hit));
        }

        self.options.observe(|| trace!(query, "query cache miss"));
        let compiled = Arc::new(compile_with(query, &self.options)?);
        self.entries().put(query.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Compile (or reuse) `query` and evaluate it from `start`
    pub fn query(&self, doc: &Document, start: NodeId, query: &str) -> Result<Vec<NodeId>, Error> {
        let compiled = self.get_or_compile(query)?;
        Ok(evaluate_with(doc, start, &compiled, &self.options)?)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries().cap().get()
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries().contains(query)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}
