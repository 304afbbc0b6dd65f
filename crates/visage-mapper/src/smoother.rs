//! 跨周期指数平滑
//!
//! 检测器的单帧测量噪声会直接变成可见的舵机抖动。平滑器对每个信号
//! 维护上一次的平滑值，按固定系数做指数低通：
//!
//! ```text
//! smoothed = alpha * raw + (1 - alpha) * previous
//! ```
//!
//! 信号第一次出现时直接取原始值，没有预热滞后。平滑状态在进程
//! 生命周期内持续累积，从不重置。

use crate::shapes::BlendShapes;
use std::collections::HashMap;

/// 指数平滑器
///
/// `alpha ∈ (0, 1]`：越小越平滑，越大越跟手。alpha = 1.0 时等价于
/// 不平滑。
#[derive(Debug, Clone)]
pub struct Smoother {
    alpha: f32,
    state: HashMap<String, f32>,
}

impl Smoother {
    /// 创建平滑器
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            state: HashMap::new(),
        }
    }

    /// 平滑系数
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// 平滑单个信号
    ///
    /// 首次出现的名称返回原始值本身，之后返回指数加权值。
    pub fn smooth(&mut self, name: &str, raw: f32) -> f32 {
        let smoothed = match self.state.get(name) {
            Some(&previous) => self.alpha * raw + (1.0 - self.alpha) * previous,
            None => raw,
        };
        self.state.insert(name.to_string(), smoothed);
        smoothed
    }

    /// 平滑整个信号集合
    pub fn apply(&mut self, shapes: &BlendShapes) -> BlendShapes {
        shapes
            .iter()
            .map(|(name, raw)| (name.to_string(), self.smooth(name, raw)))
            .collect()
    }
}
