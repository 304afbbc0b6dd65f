//! # Visage Protocol
//!
//! 舵机控制线协议定义（无网络依赖）
//!
//! ## 模块
//!
//! - `command`: 单条舵机命令的编码与解析
//! - `frame`: 帧编码、容错解码与字节流重组
//! - `ranges`: 舵机通道角度范围表
//!
//! ## 线格式
//!
//! 协议为 ASCII 文本，跑在可靠有序的字节流（TCP）之上：
//!
//! ```text
//! <id>,<angle>,<duration_ms> <id>,<angle>,<duration_ms> ... \n
//! ```
//!
//! 一帧是一行：命令之间以单个空格分隔，行尾为单个 `\n`。
//! 帧内容中不允许出现换行符。服务端不回复任何响应帧。

pub mod command;
pub mod frame;
pub mod ranges;

// 重新导出常用类型
pub use command::ServoCommand;
pub use frame::{FrameAssembler, decode_frame, encode_frame};
pub use ranges::{SERVO_COUNT, SERVO_RANGES, angle_range, is_known_channel};

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 命令 token 的字段数不是 3
    #[error("Invalid command token {token:?}: expected 3 comma-separated fields, got {fields}")]
    InvalidFieldCount { token: String, fields: usize },

    /// 字段无法解析为整数
    #[error("Invalid {field} in command token {token:?}")]
    InvalidInteger { field: &'static str, token: String },

    /// 通道 id 不在服务端已知的范围表中
    #[error("Unknown servo channel id: {id}")]
    UnknownChannel { id: u8 },

    /// 帧内容不是合法 UTF-8
    #[error("Frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
