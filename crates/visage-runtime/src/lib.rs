//! # Visage Runtime
//!
//! 跟踪客户端的运行时：信号源、周期节拍与控制循环
//!
//! ## 模块
//!
//! - `config`: TOML 配置（连接、节拍、平滑、通道、灵敏度）
//! - `source`: 检测器边界（`SignalSource` trait 与文件/流实现）
//! - `pacer`: 周期节拍策略（实时跳帧门限、录制流补偿睡眠）
//! - `cycle`: 检测 → 映射 → 发送 的循环，三种采集模式
//!
//! 客户端侧是单一逻辑序列：采集、检测、映射、编码、发送，周期之间
//! 不重叠。视觉检测本身是外部协作方，这里只消费它的输出。

pub mod config;
pub mod cycle;
pub mod pacer;
pub mod source;

// 重新导出常用类型
pub use config::{Config, ConfigError};
pub use cycle::{run_live, run_recorded, run_single};
pub use pacer::SkipGate;
pub use source::{Detection, JsonlSource, SignalSource, SourceError, StaticSource};
