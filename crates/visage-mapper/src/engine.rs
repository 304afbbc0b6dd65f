//! 映射引擎
//!
//! 引擎持有平滑状态、灵敏度表和活动通道子集，每个周期把一个信号
//! 集合变成一批舵机命令。引擎实例由调用方显式持有并传入循环，
//! 不存在进程级的环境状态。

use crate::channel::channel;
use crate::shapes::BlendShapes;
use crate::smoother::Smoother;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, warn};
use visage_protocol::{SERVO_COUNT, ServoCommand, is_known_channel};

/// 一个周期的命令批
///
/// 最多 `SERVO_COUNT` 条命令，栈上缓冲避免每周期的堆分配。
pub type CommandBatch = SmallVec<[ServoCommand; SERVO_COUNT]>;

/// 通道灵敏度表
///
/// 自由格式的键 → 倍率映射。缺失的键读作 1.0，因此未标定的通道
/// 开箱即用。
#[derive(Debug, Clone, Default)]
pub struct Sensitivity {
    multipliers: HashMap<String, f32>,
}

impl Sensitivity {
    /// 查询灵敏度，缺失时返回 1.0
    pub fn get(&self, key: &str) -> f32 {
        self.multipliers.get(key).copied().unwrap_or(1.0)
    }

    /// 设置灵敏度
    pub fn set(&mut self, key: impl Into<String>, multiplier: f32) {
        self.multipliers.insert(key.into(), multiplier);
    }
}

impl From<HashMap<String, f32>> for Sensitivity {
    fn from(multipliers: HashMap<String, f32>) -> Self {
        Self { multipliers }
    }
}

/// 引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 平滑系数；`None` 表示关闭平滑
    pub smoothing_alpha: Option<f32>,
    /// 灵敏度表
    pub sensitivity: Sensitivity,
    /// 活动通道子集（任意顺序，引擎会排序去重）
    pub active: Vec<u8>,
    /// 目标周期率（每秒周期数），决定命令的 duration_ms
    pub target_fps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: Some(0.3),
            sensitivity: Sensitivity::default(),
            active: (1..=SERVO_COUNT as u8).collect(),
            target_fps: 20,
        }
    }
}

/// BlendShape → 舵机命令映射引擎
#[derive(Debug)]
pub struct MapperEngine {
    smoother: Option<Smoother>,
    sensitivity: Sensitivity,
    /// 活动通道，升序且去重
    active: Vec<u8>,
    duration_ms: u32,
    /// 各通道上一次的角度，用于变化跟踪
    last_angles: HashMap<u8, f32>,
}

impl MapperEngine {
    /// 创建引擎
    ///
    /// 活动子集中未知的通道 id 在此处剔除并告警，之后的每个周期
    /// 不再重复检查。
    pub fn new(config: EngineConfig) -> Self {
        let mut active: Vec<u8> = config
            .active
            .into_iter()
            .filter(|&id| {
                let known = is_known_channel(id);
                if !known {
                    warn!(id, "Ignoring unknown servo channel in active set");
                }
                known
            })
            .collect();
        active.sort_unstable();
        active.dedup();

        // duration = 1000 / fps，进程内常量
        let duration_ms = 1000 / config.target_fps.max(1);

        Self {
            smoother: config.smoothing_alpha.map(Smoother::new),
            sensitivity: config.sensitivity,
            active,
            duration_ms,
            last_angles: HashMap::new(),
        }
    }

    /// 命令的运动时长（毫秒）
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// 活动通道子集（升序）
    pub fn active_channels(&self) -> &[u8] {
        &self.active
    }

    /// 把一个周期的信号集合映射为命令批
    ///
    /// 按活动通道 id 升序求值。角度截断为整数（向零取整）后编码。
    /// 单个通道缺失描述符时跳过该通道，不影响批内其余命令。
    pub fn map_cycle(&mut self, shapes: &BlendShapes) -> CommandBatch {
        let shapes: Cow<'_, BlendShapes> = match &mut self.smoother {
            Some(smoother) => Cow::Owned(smoother.apply(shapes)),
            None => Cow::Borrowed(shapes),
        };

        let mut batch = CommandBatch::new();
        for &id in &self.active {
            let Some(descriptor) = channel(id) else {
                continue;
            };

            let angle = descriptor.target_angle(&shapes, &self.sensitivity);

            // 变化跟踪：单通道移动超过 1° 时记录
            let last = self.last_angles.entry(id).or_insert(angle);
            if (angle - *last).abs() > 1.0 {
                debug!(servo = id, angle, "Servo angle changed");
            }
            *last = angle;

            batch.push(ServoCommand::new(id, angle as i32, self.duration_ms));
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_without_smoothing(active: Vec<u8>) -> MapperEngine {
        MapperEngine::new(EngineConfig {
            smoothing_alpha: None,
            sensitivity: Sensitivity::default(),
            active,
            target_fps: 20,
        })
    }

    #[test]
    fn test_duration_from_fps() {
        let engine = engine_without_smoothing(vec![1]);
        assert_eq!(engine.duration_ms(), 50);

        let engine = MapperEngine::new(EngineConfig {
            target_fps: 25,
            ..EngineConfig::default()
        });
        assert_eq!(engine.duration_ms(), 40);
    }

    #[test]
    fn test_active_set_sorted_and_deduped() {
        let engine = engine_without_smoothing(vec![13, 6, 13, 1]);
        assert_eq!(engine.active_channels(), &[1, 6, 13]);
    }

    #[test]
    fn test_unknown_active_ids_dropped() {
        let engine = engine_without_smoothing(vec![3, 0, 42, 7]);
        assert_eq!(engine.active_channels(), &[3, 7]);
    }

    #[test]
    fn test_batch_ascending_order() {
        let mut engine = engine_without_smoothing(vec![13, 6]);
        let shapes = BlendShapes::from([("jawOpen", 0.8)]);
        let batch = engine.map_cycle(&shapes);

        let ids: Vec<u8> = batch.iter().map(|cmd| cmd.id).collect();
        assert_eq!(ids, vec![6, 13]);
    }

    #[test]
    fn test_eye_vertical_scenario() {
        // eyeLookUpLeft=0.8, eyeLookUpRight=0.2 → 通道 12 → 39.2 → 截断 39
        let mut engine = engine_without_smoothing(vec![12]);
        let shapes = BlendShapes::from([("eyeLookUpLeft", 0.8), ("eyeLookUpRight", 0.2)]);
        let batch = engine.map_cycle(&shapes);

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0], ServoCommand::new(12, 39, 50));
    }

    #[test]
    fn test_truncation_toward_zero() {
        // 向下 0.8 → -17.6 → 向零截断为 -17
        let mut engine = engine_without_smoothing(vec![12]);
        let shapes = BlendShapes::from([("eyeLookDownLeft", 0.8)]);
        let batch = engine.map_cycle(&shapes);
        assert_eq!(batch[0].angle, -17);
    }

    #[test]
    fn test_empty_signals_full_batch() {
        // 没有信号也产出完整批：每个活动通道都有确定的静息角度
        let mut engine = engine_without_smoothing((1..=20).collect());
        let batch = engine.map_cycle(&BlendShapes::new());
        assert_eq!(batch.len(), 20);

        for cmd in &batch {
            let (min, max) = visage_protocol::angle_range(cmd.id).unwrap();
            assert!(cmd.angle >= min && cmd.angle <= max);
        }
    }

    #[test]
    fn test_smoothing_applied_across_cycles() {
        let mut engine = MapperEngine::new(EngineConfig {
            smoothing_alpha: Some(0.3),
            sensitivity: Sensitivity::default(),
            active: vec![18],
            target_fps: 20,
        });

        // 第一周期：首次出现直接取原始值 1.0 → 36
        let batch = engine.map_cycle(&BlendShapes::from([("browOuterUpRight", 1.0)]));
        assert_eq!(batch[0].angle, 36);

        // 第二周期：raw 0.0 → 平滑 0.7 → 0.7 * 36 = 25.2 → 25
        let batch = engine.map_cycle(&BlendShapes::from([("browOuterUpRight", 0.0)]));
        assert_eq!(batch[0].angle, 25);
    }

    #[test]
    fn test_smoothing_disabled_passthrough() {
        let mut engine = engine_without_smoothing(vec![18]);
        engine.map_cycle(&BlendShapes::from([("browOuterUpRight", 1.0)]));
        let batch = engine.map_cycle(&BlendShapes::from([("browOuterUpRight", 0.0)]));
        assert_eq!(batch[0].angle, 0);
    }

    #[test]
    fn test_sensitivity_from_map() {
        let mut multipliers = HashMap::new();
        multipliers.insert("eye_up".to_string(), 0.5);
        let sensitivity = Sensitivity::from(multipliers);

        assert_eq!(sensitivity.get("eye_up"), 0.5);
        // 缺失键默认 1.0
        assert_eq!(sensitivity.get("cheek_left_up"), 1.0);
    }
}
