// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Expression cache
//!
//! Bounded LRU cache from raw expression text to parsed expressions, shared
//! by every render of the process. Entries are complete, immutable
//! [`ParsedExpression`] values; a reader holding one keeps it alive after
//! eviction.

use crate::engine::ParsedExpression;
use crate::error::CacheConsistencyError;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached expressions. Default: 500
    pub max_entries: usize,
    /// Whether parsed expressions are cached at all. Default: true
    pub enabled: bool,
    /// Also cache the outer text produced by preprocessing. Default: false
    pub cache_composite_parts: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 500,
            enabled: true,
            cache_composite_parts: false,
        }
    }
}

impl CacheConfig {
    /// Set the maximum number of entries
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Enable or disable caching
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enable or disable caching of preprocessed outer text
    pub fn with_composite_parts(mut self, enabled: bool) -> Self {
        self.cache_composite_parts = enabled;
        self
    }
}

/// Cache key: raw text plus whether it was authored as a whole expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Raw expression text
    pub text: Arc<str>,
    /// `true` for authored expressions, `false` for text produced by preprocessing
    pub simple: bool,
}

impl CacheKey {
    /// Create a key
    pub fn new(text: &str, simple: bool) -> Self {
        Self {
            text: Arc::from(text),
            simple,
        }
    }
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to parse
    pub misses: u64,
    /// Current number of entries
    pub entries: usize,
    /// Entries dropped to make room
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache, 0.0 when there were none
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe LRU cache of parsed expressions
pub struct ExpressionCache {
    entries: Option<Mutex<LruCache<CacheKey, ParsedExpression>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl ExpressionCache {
    /// Create a cache; a disabled cache or zero capacity stores nothing
    pub fn new(config: &CacheConfig) -> Self {
        let entries = NonZeroUsize::new(config.max_entries)
            .filter(|_| config.enabled)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));
        Self {
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Whether the cache stores anything
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Look up an expression, updating recency and statistics
    pub fn get(&self, text: &str, simple: bool) -> Option<ParsedExpression> {
        let entries = self.entries.as_ref()?;
        let key = CacheKey::new(text, simple);
        let found = entries.lock().get(&key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("expression cache hit for {text:?}");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            log::trace!("expression cache miss for {text:?}");
        }
        found
    }

    /// Store a parsed expression; an entry already present for the key wins
    pub fn insert(&self, text: &str, simple: bool, parsed: ParsedExpression) -> ParsedExpression {
        let Some(entries) = &self.entries else {
            return parsed;
        };
        let key = CacheKey::new(text, simple);
        let mut entries = entries.lock();
        if let Some(existing) = entries.get(&key) {
            return existing.clone();
        }
        if let Some((evicted, _)) = entries.push(key, parsed.clone()) {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            log::trace!("expression cache evicted {:?}", evicted.text);
        }
        parsed
    }

    /// Cached expression, or the result of `parse` stored under the key
    ///
    /// Parsing happens outside the lock; when two threads race on the same
    /// text, the first stored entry is returned to both.
    pub fn get_or_parse<E>(
        &self,
        text: &str,
        simple: bool,
        parse: impl FnOnce() -> Result<ParsedExpression, E>,
    ) -> Result<ParsedExpression, E> {
        if let Some(found) = self.get(text, simple) {
            return Ok(found);
        }
        let parsed = parse()?;
        Ok(self.insert(text, simple, parsed))
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.lock().len())
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Check every entry against its key
    ///
    /// An entry must have been parsed from its key text, and `reparse` of the
    /// key must produce the same tree.
    pub fn verify(
        &self,
        reparse: impl Fn(&str, bool) -> Option<ParsedExpression>,
    ) -> Result<(), CacheConsistencyError> {
        let Some(entries) = &self.entries else {
            return Ok(());
        };
        let snapshot: Vec<(CacheKey, ParsedExpression)> = entries
            .lock()
            .iter()
            .map(|(key, parsed)| (key.clone(), parsed.clone()))
            .collect();

        for (key, parsed) in snapshot {
            if parsed.source() != key.text.as_ref() {
                return Err(CacheConsistencyError::KeyMismatch {
                    key: key.text.to_string(),
                    found: parsed.source().to_string(),
                });
            }
            let fresh = reparse(&key.text, key.simple);
            if fresh.as_ref().map(ParsedExpression::compiled) != Some(parsed.compiled()) {
                return Err(CacheConsistencyError::StaleEntry {
                    key: key.text.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("ExpressionCache")
            .field("enabled", &self.is_enabled())
            .field("entries", &stats.entries)
            .field("hit_rate", &format!("{:.1}%", stats.hit_rate() * 100.0))
            .field("evictions", &stats.evictions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParserConfig, compile};

    fn parsed(text: &str) -> ParsedExpression {
        ParsedExpression::new(text, compile(text, &ParserConfig::default()).unwrap())
    }

    #[test]
    fn test_hits_and_misses() {
        let cache = ExpressionCache::default();
        assert!(cache.get("1 + 2", true).is_none());
        cache.insert("1 + 2", true, parsed("1 + 2"));
        assert!(cache.get("1 + 2", true).is_some());
        assert!(cache.get("1 + 2", false).is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 2, 1));
        assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = ExpressionCache::new(&CacheConfig::default().with_max_entries(2));
        cache.insert("1", true, parsed("1"));
        cache.insert("2", true, parsed("2"));
        cache.get("1", true);
        cache.insert("3", true, parsed("3"));

        assert!(cache.get("1", true).is_some());
        assert!(cache.get("2", true).is_none());
        assert!(cache.get("3", true).is_some());
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        for config in [
            CacheConfig::default().with_enabled(false),
            CacheConfig::default().with_max_entries(0),
        ] {
            let cache = ExpressionCache::new(&config);
            cache.insert("1", true, parsed("1"));
            assert!(cache.is_empty());
            assert!(cache.get("1", true).is_none());
            assert_eq!(cache.stats().misses, 0);
        }
    }

    #[test]
    fn test_get_or_parse_runs_parser_once() {
        let cache = ExpressionCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            let result: Result<_, ()> = cache.get_or_parse("a + b", true, || {
                calls += 1;
                Ok(parsed("a + b"))
            });
            assert!(result.is_ok());
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_verify_detects_mismatch() {
        let cache = ExpressionCache::default();
        let reparse = |text: &str, _simple: bool| Some(parsed(text));

        cache.insert("1 + 2", true, parsed("1 + 2"));
        assert_eq!(cache.verify(reparse), Ok(()));

        cache.insert("3", true, parsed("4"));
        assert_eq!(
            cache.verify(reparse),
            Err(CacheConsistencyError::KeyMismatch {
                key: "3".into(),
                found: "4".into()
            })
        );
    }

    #[test]
    fn test_clear_resets_stats() {
        let cache = ExpressionCache::default();
        cache.insert("1", true, parsed("1"));
        cache.get("1", true);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
