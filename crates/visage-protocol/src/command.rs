//! 单条舵机命令的编码与解析
//!
//! 命令是临时三元组 `(id, angle, duration_ms)`：
//!
//! - `id`: 通道 id（服务端以范围表校验）
//! - `angle`: 有符号整数角度（度），发送前已被映射层夹入通道范围
//! - `duration_ms`: 舵机运动时长（毫秒），客户端进程内为常量 `1000 / fps`

use crate::ProtocolError;
use std::fmt;

/// 一条舵机控制命令
///
/// 线格式为 `"<id>,<angle>,<duration_ms>"`，由 [`fmt::Display`] 产生、
/// [`ServoCommand::parse`] 还原。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoCommand {
    /// 通道 id
    pub id: u8,
    /// 目标角度（度）
    pub angle: i32,
    /// 运动时长（毫秒）
    pub duration_ms: u32,
}

impl ServoCommand {
    /// 创建命令
    pub fn new(id: u8, angle: i32, duration_ms: u32) -> Self {
        Self { id, angle, duration_ms }
    }

    /// 从单个 token 解析命令
    ///
    /// token 必须恰好包含 3 个逗号分隔的整数字段。任何解析失败都只
    /// 作用于这一个 token，由调用方决定跳过还是中止（服务端选择跳过）。
    pub fn parse(token: &str) -> Result<Self, ProtocolError> {
        let fields: Vec<&str> = token.split(',').collect();
        if fields.len() != 3 {
            return Err(ProtocolError::InvalidFieldCount {
                token: token.to_string(),
                fields: fields.len(),
            });
        }

        let id: u8 = fields[0].parse().map_err(|_| ProtocolError::InvalidInteger {
            field: "channel id",
            token: token.to_string(),
        })?;
        let angle: i32 = fields[1].parse().map_err(|_| ProtocolError::InvalidInteger {
            field: "angle",
            token: token.to_string(),
        })?;
        let duration_ms: u32 = fields[2].parse().map_err(|_| ProtocolError::InvalidInteger {
            field: "duration",
            token: token.to_string(),
        })?;

        Ok(Self { id, angle, duration_ms })
    }

    /// 校验通道 id 是否在范围表中
    pub fn validate_channel(&self) -> Result<(), ProtocolError> {
        if crate::ranges::is_known_channel(self.id) {
            Ok(())
        } else {
            Err(ProtocolError::UnknownChannel { id: self.id })
        }
    }
}

impl fmt::Display for ServoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.id, self.angle, self.duration_ms)
    }
}
