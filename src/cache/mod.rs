//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 缓存模块
//!
//! 两级响应缓存：内存层保存解码后的值，磁盘层保存流式响应的原始字节。
//! 读取时磁盘优先，其次内存。存储层错误只记录告警，不向上传播。

pub mod disk;
pub mod key;
pub mod memory;

pub use disk::{DiskCache, StagedFile};
pub use key::{cache_key, path_only, request_id};
pub use memory::{CacheStats, MemoryCache};

use crate::response::{CachedValue, Response};
use std::path::PathBuf;
use tracing::{debug, warn};

/// 两级响应缓存
#[derive(Debug)]
pub struct ResponseCache {
    memory: MemoryCache,
    disk: DiskCache,
}

impl ResponseCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            memory: MemoryCache::new(),
            disk: DiskCache::new(cache_dir),
        }
    }

    /// 写入内存层
    pub fn put_value(&self, key: &str, value: CachedValue) {
        self.memory.put(key, value);
    }

    /// 写入磁盘层，失败时记录告警并返回 false
    pub async fn put_bytes(&self, key: &str, bytes: &[u8]) -> bool {
        match self.disk.put(key, bytes).await {
            Ok(()) => true,
            Err(e) => {
                warn!("磁盘缓存写入失败: key={}, error={}", key, e);
                false
            }
        }
    }

    /// 读取：磁盘优先，其次内存
    pub async fn get(&self, key: &str) -> Option<Response> {
        match self.disk.get(key).await {
            Ok(Some(handle)) => {
                debug!("命中磁盘缓存: key={}", key);
                return Some(Response::Stream(handle));
            }
            Ok(None) => {}
            Err(e) => warn!("磁盘缓存读取失败，回退到内存缓存: key={}, error={}", key, e),
        }

        self.memory.get(key).map(|value| {
            debug!("命中内存缓存: key={}", key);
            Response::Value(value)
        })
    }

    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }
}
