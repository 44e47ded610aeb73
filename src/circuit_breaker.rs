//! 熔断器注册表实现
//!
//! 为每个请求标识（`method + url`）维护一个独立的熔断器状态。
//!
//! # 特性
//!
//! - **三状态**: Closed（关闭）、Open（打开）、HalfOpen（半开）
//! - **按标识隔离**: 状态按需创建，进程生命周期内不移除
//! - **原子转换**: Open -> HalfOpen 在 DashMap 条目锁内完成，探测请求可能仍在进行时不放行第二个
//! - **统计信息**: 提供单个标识快照与整体统计
//!
//! # 状态转换
//!
//! ```text
//! Closed   -> Open     : failure_count > threshold
//! Open     -> HalfOpen : now >= next_retry_at（放行一个探测请求）
//! HalfOpen -> Closed   : 探测成功
//! HalfOpen -> Open     : 探测失败（重新计算 next_retry_at）
//! ```

use crate::config::BreakerConfig;
use crate::error::CircuitState;
use dashmap::DashMap;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// 单个标识的熔断器状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerState {
    /// 连续失败次数（仅在成功时清零）
    pub failure_count: u32,
    /// 当前状态
    pub status: CircuitState,
    /// 下次允许尝试的时间（Unix 秒）
    pub next_retry_at: f64,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self {
            failure_count: 0,
            status: CircuitState::Closed,
            next_retry_at: 0.0,
        }
    }
}

/// 熔断器状态快照
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BreakerSnapshot {
    pub id: String,
    pub failure_count: u32,
    pub threshold: u32,
    pub cold_period: Duration,
    pub status: CircuitState,
    pub next_retry_at: f64,
}

/// 注册表统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub closed: usize,
    pub open: usize,
    pub half_open: usize,
}

/// 熔断器注册表
#[derive(Debug)]
pub struct BreakerRegistry {
    states: DashMap<String, BreakerState>,
    threshold: u32,
    cold_period: Duration,
}

impl BreakerRegistry {
    /// 创建新的熔断器注册表
    ///
    /// # 示例
    /// ```rust
    /// use cachefuse::circuit_breaker::BreakerRegistry;
    /// use std::time::Duration;
    ///
    /// let registry = BreakerRegistry::new(5, Duration::from_secs(10));
    /// assert!(registry.can_attempt("GEThttp://example.com/"));
    /// ```
    pub fn new(threshold: u32, cold_period: Duration) -> Self {
        info!(
            "创建熔断器注册表: threshold={}, cold_period={:?}",
            threshold, cold_period
        );

        Self {
            states: DashMap::new(),
            threshold,
            cold_period,
        }
    }

    /// 从配置创建
    pub fn from_config(config: &BreakerConfig) -> Self {
        Self::new(config.failure_threshold, config.cold_period)
    }

    /// 获取或创建标识对应的状态
    pub fn get_or_create(&self, id: &str) -> BreakerSnapshot {
        let state = *self.states.entry(id.to_string()).or_default();
        self.to_snapshot(id, state)
    }

    /// 检查是否允许发起请求
    ///
    /// 等价于 `can_attempt_within(id, Duration::ZERO)`：探测请求放行后，
    /// 后续请求至少等待一个冷却期。
    pub fn can_attempt(&self, id: &str) -> bool {
        self.can_attempt_within(id, Duration::ZERO)
    }

    /// 检查是否允许发起请求，`trial_timeout` 为探测请求的最长耗时
    ///
    /// Open 状态在冷却期结束后转换为 HalfOpen 并放行当前请求，同时把
    /// `next_retry_at` 推迟 `max(cold_period, trial_timeout)`，探测请求仍可能在
    /// 进行时不会放行第二个。探测请求未记录结果（被调用方丢弃）时，该时间过后
    /// 重新放行。
    pub fn can_attempt_within(&self, id: &str, trial_timeout: Duration) -> bool {
        let now = now_secs();
        let mut state = self.states.entry(id.to_string()).or_default();

        match state.status {
            CircuitState::Closed => true,
            CircuitState::Open | CircuitState::HalfOpen => {
                if now < state.next_retry_at {
                    trace!(
                        "熔断器拒绝请求: id={}, 剩余冷却 {:.3}s",
                        id,
                        state.next_retry_at - now
                    );
                    return false;
                }

                let hold = self.cold_period.max(trial_timeout);
                let old_status = state.status;
                state.status = CircuitState::HalfOpen;
                state.next_retry_at = now + hold.as_secs_f64();

                if old_status == CircuitState::HalfOpen {
                    debug!("探测请求未记录结果，重新放行: id={}", id);
                } else {
                    info!("熔断器状态变更: id={}, {} -> HalfOpen", id, old_status);
                }
                true
            }
        }
    }

    /// 记录一次成功，重置为关闭状态
    pub fn record_success(&self, id: &str) {
        let old = self.states.insert(id.to_string(), BreakerState::default());

        match old {
            Some(old) if old.status != CircuitState::Closed => {
                info!("熔断器状态变更: id={}, {} -> Closed", id, old.status);
            }
            _ => trace!("操作成功: id={}", id),
        }
    }

    /// 记录一次失败
    ///
    /// 失败次数严格大于阈值时打开熔断器，之后每次失败都会重新计算 `next_retry_at`。
    pub fn record_failure(&self, id: &str) {
        let now = now_secs();
        let mut state = self.states.entry(id.to_string()).or_default();
        state.failure_count = state.failure_count.saturating_add(1);

        if state.failure_count > self.threshold {
            let old_status = state.status;
            state.status = CircuitState::Open;
            state.next_retry_at = now + self.cold_period.as_secs_f64();
            warn!(
                "熔断器状态变更: id={}, {} -> Open (failure_count={})",
                id, old_status, state.failure_count
            );
        } else {
            trace!(
                "操作失败: id={}, {}/{}",
                id,
                state.failure_count,
                self.threshold
            );
        }
    }

    /// 获取快照，标识不存在时返回 None
    pub fn snapshot(&self, id: &str) -> Option<BreakerSnapshot> {
        self.states
            .get(id)
            .map(|state| self.to_snapshot(id, *state))
    }

    /// 获取当前状态，标识不存在时视为关闭
    pub fn state(&self, id: &str) -> CircuitState {
        self.states
            .get(id)
            .map(|state| state.status)
            .unwrap_or(CircuitState::Closed)
    }

    /// 重置指定标识
    pub fn reset(&self, id: &str) {
        info!("重置熔断器: id={}", id);
        self.states.insert(id.to_string(), BreakerState::default());
    }

    /// 已跟踪的标识数量
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// 获取统计信息
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for entry in self.states.iter() {
            stats.total += 1;
            match entry.status {
                CircuitState::Closed => stats.closed += 1,
                CircuitState::Open => stats.open += 1,
                CircuitState::HalfOpen => stats.half_open += 1,
            }
        }
        stats
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn cold_period(&self) -> Duration {
        self.cold_period
    }

    fn to_snapshot(&self, id: &str, state: BreakerState) -> BreakerSnapshot {
        BreakerSnapshot {
            id: id.to_string(),
            failure_count: state.failure_count,
            threshold: self.threshold,
            cold_period: self.cold_period,
            status: state.status,
            next_retry_at: state.next_retry_at,
        }
    }
}

/// 当前 Unix 时间（秒，微秒精度）
pub(crate) fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
