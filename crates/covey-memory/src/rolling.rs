use chrono::{DateTime, Local};
use covey_core::Memory;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tuning knobs for [`RollingMemory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingMemoryConfig {
    /// Entries kept before the oldest is evicted.
    pub max_items: usize,
    /// Upper bound, in characters, on rendered context.
    pub max_context_length: usize,
    /// Weight of recency against relevance when ranking, in `0.0..=1.0`.
    pub recency_bias: f64,
}

impl Default for RollingMemoryConfig {
    fn default() -> Self {
        Self {
            max_items: 100,
            max_context_length: 2000,
            recency_bias: 0.7,
        }
    }
}

/// One remembered entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryItem {
    pub content: String,
    pub timestamp: DateTime<Local>,
    pub metadata: Value,
    /// Insertion sequence number, unique for the lifetime of the memory.
    pub seq: u64,
}

impl MemoryItem {
    fn render(&self) -> String {
        format!(
            "[{}] {}\n\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.content
        )
    }
}

/// Summary returned by [`RollingMemory::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total_items: usize,
    pub max_items: usize,
    pub max_context_length: usize,
    pub recency_bias: f64,
    pub oldest_timestamp: Option<String>,
    pub newest_timestamp: Option<String>,
}

#[derive(Debug, Default)]
struct Store {
    items: VecDeque<MemoryItem>,
    next_seq: u64,
}

/// Bounded, recency-biased memory.
///
/// Clones share the same storage, so one instance can back several agents.
#[derive(Debug, Clone, Default)]
pub struct RollingMemory {
    config: RollingMemoryConfig,
    store: Arc<RwLock<Store>>,
}

impl RollingMemory {
    pub fn new(config: RollingMemoryConfig) -> Self {
        Self {
            config,
            store: Arc::new(RwLock::new(Store::default())),
        }
    }

    pub fn config(&self) -> &RollingMemoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    /// Entries ranked for `query`, best first, at most `limit` of them.
    pub fn search(&self, query: &str, limit: usize) -> Vec<MemoryItem> {
        let store = self.read();
        self.ranked(&store, Some(query), limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> MemoryStats {
        let store = self.read();
        let stamp = |item: &MemoryItem| item.timestamp.format(TIMESTAMP_FORMAT).to_string();
        MemoryStats {
            total_items: store.items.len(),
            max_items: self.config.max_items,
            max_context_length: self.config.max_context_length,
            recency_bias: self.config.recency_bias,
            oldest_timestamp: store.items.front().map(stamp),
            newest_timestamp: store.items.back().map(stamp),
        }
    }

    /// Entries in rendering order.
    ///
    /// Without a query this is newest first. With a query each entry scores
    /// `relevance * (1 - bias) + recency * bias`, where relevance is 1 when
    /// the query occurs in the content (ignoring case) and recency is the
    /// entry's position normalised to `0.0..=1.0` between the oldest and
    /// newest entry. Equal scores keep insertion order.
    fn ranked<'a>(
        &self,
        store: &'a Store,
        query: Option<&str>,
        limit: usize,
    ) -> Vec<&'a MemoryItem> {
        let query = query.filter(|q| !q.is_empty());
        let Some(query) = query else {
            return store.items.iter().rev().take(limit).collect();
        };

        let (Some(oldest), Some(newest)) = (store.items.front(), store.items.back()) else {
            return Vec::new();
        };
        let span = (newest.seq - oldest.seq) as f64;
        let needle = query.to_lowercase();
        let bias = self.config.recency_bias;

        let mut scored: Vec<(f64, &MemoryItem)> = store
            .items
            .iter()
            .map(|item| {
                let relevance = if item.content.to_lowercase().contains(&needle) {
                    1.0
                } else {
                    0.0
                };
                let recency = if span == 0.0 {
                    1.0
                } else {
                    (item.seq - oldest.seq) as f64 / span
                };
                (relevance * (1.0 - bias) + recency * bias, item)
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, item)| item).collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Memory for RollingMemory {
    fn add(&self, content: &str, metadata: Option<Value>) {
        let mut store = self.write();
        let seq = store.next_seq;
        store.next_seq += 1;
        store.items.push_back(MemoryItem {
            content: content.to_string(),
            timestamp: Local::now(),
            metadata: metadata.unwrap_or_else(|| Value::Object(Default::default())),
            seq,
        });
        while store.items.len() > self.config.max_items {
            store.items.pop_front();
        }
        trace!(seq, items = store.items.len(), "Memory entry added");
    }

    fn context(&self, query: Option<&str>) -> String {
        let store = self.read();
        let limit = self.config.max_context_length;
        let mut context = String::new();
        let mut used = 0usize;

        for item in self.ranked(&store, query, self.config.max_items) {
            let text = item.render();
            let len = text.chars().count();
            if used + len > limit {
                if used == 0 {
                    context.extend(text.chars().take(limit.saturating_sub(3)));
                    context.push_str("...");
                }
                break;
            }
            context.push_str(&text);
            used += len;
        }

        context.trim().to_string()
    }

    fn clear(&self) {
        self.write().items.clear();
    }
}
