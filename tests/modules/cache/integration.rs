//! 缓存模块集成测试
//!
//! 测试内存层与磁盘层的组合行为

use cachefuse::{cache_key, CachedValue, ResponseCache};

/// 测试磁盘层保存的字节与写入完全一致
#[tokio::test]
async fn test_disk_roundtrip_exact_bytes() {
    let root = tempfile::tempdir().unwrap();
    let cache = ResponseCache::new(root.path().join("nested").join("_cache"));
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let key = cache_key("GET", "https://cdn.local/file.bin");

    assert!(cache.put_bytes(&key, &payload).await);

    let handle = cache.get(&key).await.unwrap().into_stream().unwrap();
    assert_eq!(handle.path(), Some(cache.disk().path_for(&key).as_path()));
    assert_eq!(handle.read_all().await.unwrap().as_ref(), payload.as_slice());
}

/// 测试查询参数不同的 URL 共享缓存条目
#[tokio::test]
async fn test_query_variants_share_entry() {
    let root = tempfile::tempdir().unwrap();
    let cache = ResponseCache::new(root.path());

    cache.put_value(
        &cache_key("GET", "/a?x=1"),
        CachedValue::Text("first".to_string()),
    );
    cache.put_value(
        &cache_key("GET", "/a?x=2"),
        CachedValue::Text("second".to_string()),
    );

    assert_eq!(cache.memory().len(), 1);
    let value = cache
        .get(&cache_key("GET", "/a"))
        .await
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(value, CachedValue::Text("second".to_string()));
}

/// 测试没有索引文件，目录中只有缓存键文件
#[tokio::test]
async fn test_cache_dir_contains_only_key_files() {
    let root = tempfile::tempdir().unwrap();
    let cache = ResponseCache::new(root.path().join("_cache"));
    let k1 = cache_key("GET", "/one");
    let k2 = cache_key("GET", "/two");

    cache.put_bytes(&k1, b"1").await;
    cache.put_bytes(&k2, b"2").await;
    cache.put_bytes(&k1, b"11").await;

    let mut names: Vec<String> = std::fs::read_dir(root.path().join("_cache"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();

    let mut expected = vec![k1, k2];
    expected.sort();
    assert_eq!(names, expected);
}
