//! 工作线程指标
//!
//! 原子计数器，任何线程都可以无锁读取。

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// 工作线程实时指标
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// 进入队列的意图数
    pub enqueued: AtomicU64,
    /// 执行成功的意图数
    pub executed: AtomicU64,
    /// 执行失败（返回错误或 panic）的意图数
    pub failed: AtomicU64,
    /// 被 Cancel / stop 丢弃的意图数
    pub cancelled: AtomicU64,
    /// 在边界处被拒绝的畸形 JSON 数
    pub malformed: AtomicU64,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub executed: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub malformed: u64,
}

impl MetricsSnapshot {
    /// 已出队并处理完的意图数
    pub fn processed(&self) -> u64 {
        self.executed + self.failed
    }
}
