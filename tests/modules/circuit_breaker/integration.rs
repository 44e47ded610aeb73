//! 熔断器模块集成测试
//!
//! 测试熔断器注册表的状态转换与冷却期

use cachefuse::{BreakerRegistry, CircuitState};
use std::time::Duration;

const ID: &str = "GEThttps://upstream.local/v1/orders?limit=10";

/// 测试失败次数超过阈值后拒绝请求，冷却期后恢复
#[tokio::test]
async fn test_threshold_plus_one_failures_block() {
    let registry = BreakerRegistry::new(3, Duration::from_millis(200));

    for _ in 0..3 {
        registry.record_failure(ID);
        assert!(registry.can_attempt(ID));
    }

    registry.record_failure(ID);
    assert_eq!(registry.state(ID), CircuitState::Open);
    assert!(!registry.can_attempt(ID));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!registry.can_attempt(ID));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(registry.can_attempt(ID));
    assert_eq!(registry.state(ID), CircuitState::HalfOpen);
}

/// 测试冷却期从最后一次失败开始计算
#[tokio::test]
async fn test_cold_period_counts_from_last_failure() {
    let registry = BreakerRegistry::new(0, Duration::from_millis(300));
    registry.record_failure(ID);

    tokio::time::sleep(Duration::from_millis(200)).await;
    // 迟到的失败结果重新计算 next_retry_at
    registry.record_failure(ID);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!registry.can_attempt(ID));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(registry.can_attempt(ID));
}

/// 测试半开状态成功后完全恢复
#[tokio::test]
async fn test_half_open_success_resets_counters() {
    let registry = BreakerRegistry::new(2, Duration::from_millis(100));
    for _ in 0..5 {
        registry.record_failure(ID);
    }
    assert_eq!(registry.snapshot(ID).unwrap().failure_count, 5);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(registry.can_attempt(ID));

    registry.record_success(ID);
    let snapshot = registry.get_or_create(ID);
    assert_eq!(snapshot.status, CircuitState::Closed);
    assert_eq!(snapshot.failure_count, 0);

    // 恢复后需要重新累计 threshold + 1 次失败才会熔断
    registry.record_failure(ID);
    registry.record_failure(ID);
    assert!(registry.can_attempt(ID));
    registry.record_failure(ID);
    assert!(!registry.can_attempt(ID));
}

/// 测试每个冷却期只放行一个探测请求
#[tokio::test]
async fn test_one_trial_per_cold_period() {
    let registry = BreakerRegistry::new(0, Duration::from_millis(100));
    registry.record_failure(ID);

    let mut admitted = 0;
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(30)).await;
        if registry.can_attempt(ID) {
            admitted += 1;
        }
    }

    // 约 300ms 内最多三个冷却期到期
    assert!(admitted >= 1);
    assert!(admitted <= 3);
}
