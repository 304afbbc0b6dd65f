//! 周期节拍策略
//!
//! 三种采集模式对应三种节拍：单次模式没有节拍；实时模式用跳帧
//! 门限限制处理频率（不排队、不积压）；录制模式测量每周期的实际
//! 耗时，睡掉非负余量（容忍漂移，不做事后补偿）。

use std::time::{Duration, Instant};

/// 补偿睡眠的最小下限
pub const MIN_SLEEP: Duration = Duration::from_millis(1);

/// 录制流的周期补偿睡眠量
///
/// `max(floor, interval - cost)`：处理耗时已超过间隔时只睡下限，
/// 绝不为负，下一周期立即开始。
pub fn compensated_sleep(interval: Duration, cost: Duration, floor: Duration) -> Duration {
    interval.saturating_sub(cost).max(floor)
}

/// 实时模式的跳帧门限
///
/// 距上一个被处理的周期不足一个间隔时，新到的帧被原样丢弃，
/// 不处理也不排队。
#[derive(Debug)]
pub struct SkipGate {
    interval: Duration,
    last: Option<Instant>,
}

impl SkipGate {
    /// 创建门限
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// 判定当前时刻到达的帧是否应被处理
    ///
    /// 放行时记录时刻作为下一次判定的基准；拒绝时不更新。
    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
