//! 缓存键计算
//!
//! `cache_key = hex(sha256(method + path))`，其中 path 不含查询串和片段，
//! 也不含 scheme 与 host。因此仅查询参数不同的请求共用同一个缓存键。

use sha2::{Digest, Sha256};

/// 提取 URL 的路径部分（丢弃查询串与片段）
///
/// 绝对 URL 通过 `url` 解析；相对 URL（如 `/a?x=1`）按字面截断。
pub fn path_only(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let end = raw.find(['?', '#']).unwrap_or(raw.len());
            raw[..end].to_string()
        }
    }
}

/// 计算缓存键
pub fn cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(path_only(url).as_bytes());
    hex::encode(hasher.finalize())
}

/// 熔断器标识：方法与完整 URL 直接拼接
pub fn request_id(method: &str, url: &str) -> String {
    format!("{}{}", method, url)
}
