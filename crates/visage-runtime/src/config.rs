//! 运行时配置
//!
//! TOML 配置文件，分节对应各子系统。所有字段都有默认值，空文件
//! 也是合法配置。配置错误在启动期致命，带上下文返回给入口层。
//!
//! ```toml
//! [connection]
//! host = "127.0.0.1"
//! port = 8888
//!
//! [pacing]
//! fps = 20
//!
//! [smoothing]
//! enabled = true
//! alpha = 0.3
//!
//! [channels]
//! active = [11, 12, 14, 15]
//!
//! [sensitivity]
//! eye_up = 1.0
//! jaw_open = 1.2
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use visage_mapper::{EngineConfig, Sensitivity};
use visage_protocol::SERVO_COUNT;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// 平滑系数必须落在 (0, 1]
    #[error("Smoothing alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f32),

    /// 目标帧率必须为正
    #[error("Target fps must be >= 1, got {0}")]
    InvalidFps(u32),
}

/// 连接配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// 舵机端点主机
    pub host: String,
    /// 舵机端点端口
    pub port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
        }
    }
}

/// 节拍配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// 目标周期率（每秒周期数）
    pub fps: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { fps: 20 }
    }
}

/// 平滑配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// 是否启用平滑
    pub enabled: bool,
    /// 平滑系数，(0, 1]
    pub alpha: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alpha: 0.3,
        }
    }
}

/// 通道配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// 本次部署驱动的通道子集
    pub active: Vec<u8>,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            active: (1..=SERVO_COUNT as u8).collect(),
        }
    }
}

/// 运行时配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 连接配置
    pub connection: ConnectionConfig,
    /// 节拍配置
    pub pacing: PacingConfig,
    /// 平滑配置
    pub smoothing: SmoothingConfig,
    /// 通道配置
    pub channels: ChannelsConfig,
    /// 灵敏度表（键 → 倍率，缺失的键为 1.0）
    pub sensitivity: HashMap<String, f32>,
}

impl Config {
    /// 从 TOML 文件加载并校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// 从 TOML 文本解析并校验
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pacing.fps == 0 {
            return Err(ConfigError::InvalidFps(self.pacing.fps));
        }
        if self.smoothing.enabled && !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(self.smoothing.alpha));
        }
        Ok(())
    }

    /// 换算为映射引擎配置
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            smoothing_alpha: self.smoothing.enabled.then_some(self.smoothing.alpha),
            sensitivity: Sensitivity::from(self.sensitivity.clone()),
            active: self.channels.active.clone(),
            target_fps: self.pacing.fps,
        }
    }

    /// 周期间隔
    pub fn cycle_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.pacing.fps as f64)
    }
}
