//! 内存缓存层
//!
//! 使用DashMap保存每个缓存键最近一次成功解码的响应值。
//! 不设置TTL，也不做淘汰；同一键的新写入直接覆盖旧值。

use crate::response::CachedValue;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// 缓存统计信息
#[derive(Debug, Default)]
pub struct CacheStats {
    /// 命中次数
    hits: AtomicU64,
    /// 未命中次数
    misses: AtomicU64,
    /// 写入次数
    writes: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// 内存缓存
#[derive(Debug, Default)]
pub struct MemoryCache {
    data: DashMap<String, CachedValue>,
    stats: CacheStats,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入（覆盖已有值）
    pub fn put(&self, key: &str, value: CachedValue) {
        self.data.insert(key.to_string(), value);
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        trace!("内存缓存写入: key={}", key);
    }

    /// 读取
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        match self.data.get(key) {
            Some(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
