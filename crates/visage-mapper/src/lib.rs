//! # Visage Mapper
//!
//! BlendShape 信号到舵机角度的映射引擎
//!
//! ## 模块
//!
//! - `shapes`: 每周期的信号集合（名称 → 强度分数）
//! - `smoother`: 跨周期指数平滑，抑制单帧检测抖动
//! - `mapping`: 范围映射原语（先夹紧后仿射缩放）
//! - `channel`: 舵机通道描述符表（四种驱动组合方式）
//! - `engine`: 映射引擎，按活动通道子集产出命令批
//!
//! ## 数据流
//!
//! ```text
//! 检测器输出 → BlendShapes → Smoother（可选）→ ServoChannel 表 → 命令批
//! ```

pub mod channel;
pub mod engine;
pub mod mapping;
pub mod shapes;
pub mod smoother;

// 重新导出常用类型
pub use channel::{CHANNELS, Direction, Drive, OpposedSide, ServoChannel, channel};
pub use engine::{CommandBatch, EngineConfig, MapperEngine, Sensitivity};
pub use mapping::range_map;
pub use shapes::BlendShapes;
pub use smoother::Smoother;
