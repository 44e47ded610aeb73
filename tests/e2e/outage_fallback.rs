//! 端到端测试：上游故障期间的缓存回退
//!
//! 测试场景：
//! 1. 上游正常，JSON 接口与下载接口各成功一次（分别写入内存与磁盘）
//! 2. 上游故障，失败请求返回缓存（JSON 值 / 文件句柄）
//! 3. 失败超过阈值后熔断，熔断期间返回 None
//! 4. 冷却期后探测仍失败，再次返回缓存并重新熔断
//! 5. 上游恢复，新数据覆盖缓存

use crate::common::{create_executor, init_test_logging, StubTransport};
use cachefuse::{CircuitState, FetchOptions, ResponseType};
use std::time::Duration;

/// 端到端测试：故障期间的回退与恢复
#[tokio::test]
async fn test_e2e_outage_fallback() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let transport = StubTransport::with_stream_payload(&b"report-2026-10.csv contents"[..]);
    let executor = create_executor(dir.path(), 1, Duration::from_millis(300), transport.clone());

    let api = FetchOptions::get("https://reports.local/api/summary?ts=1");
    let download =
        FetchOptions::get("https://reports.local/download").response_type(ResponseType::Stream);

    // Step 1: 正常请求
    let summary = executor
        .fetch(api.clone())
        .await
        .unwrap()
        .into_value()
        .unwrap();
    assert!(executor.fetch(download.clone()).await.unwrap().is_stream());

    // Step 2: 上游故障，返回缓存
    transport.set_failing(true);
    let stale = executor
        .fetch_outcome(FetchOptions::get("https://reports.local/api/summary?ts=2"))
        .await;
    assert!(stale.is_stale());
    assert_eq!(stale.into_response().unwrap().into_value().unwrap(), summary);

    let stale_file = executor
        .fetch(download.clone())
        .await
        .unwrap()
        .into_stream()
        .unwrap();
    assert!(stale_file.is_file());
    assert_eq!(
        stale_file.read_all().await.unwrap().as_ref(),
        b"report-2026-10.csv contents"
    );

    // Step 3: 第二次失败超过阈值，熔断期间返回 None
    assert!(executor.fetch(download.clone()).await.is_some());
    let download_id = "GEThttps://reports.local/download";
    assert_eq!(executor.registry().state(download_id), CircuitState::Open);
    let calls = transport.calls();
    assert!(executor.fetch(download.clone()).await.is_none());
    assert_eq!(transport.calls(), calls);

    // Step 4: 冷却期后探测失败，仍返回缓存
    tokio::time::sleep(Duration::from_millis(350)).await;
    let outcome = executor.fetch_outcome(download.clone()).await;
    assert!(outcome.is_stale());
    assert_eq!(transport.calls(), calls + 1);
    assert_eq!(executor.registry().state(download_id), CircuitState::Open);

    // Step 5: 上游恢复
    tokio::time::sleep(Duration::from_millis(350)).await;
    transport.set_failing(false);
    let fresh = executor.fetch_outcome(api).await;
    assert!(fresh.is_fresh());
    let fresh_outcome = executor.fetch_outcome(download).await;
    assert!(fresh_outcome.is_fresh());
    assert_eq!(executor.registry().state(download_id), CircuitState::Closed);

    let stats = executor.registry().stats();
    assert_eq!(stats.open, 0);
    assert_eq!(stats.half_open, 0);
}
