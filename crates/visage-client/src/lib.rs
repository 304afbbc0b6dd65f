//! # Visage Client
//!
//! 舵机控制端点的传输客户端
//!
//! 客户端持有 0 或 1 条到执行端点的 TCP 连接，发送编码好的命令帧。
//! 发送是尽力而为：不确认、不重试、不产生背压。控制循环绝不能因为
//! 端点不可达而崩溃，所以这里的任何失败都只降级和记录，从不向调用
//! 方抛出。断线期间表情跟踪照常运行，命令被丢弃，重连由调用方再次
//! `connect` 发起。

use std::io::Write;
use std::net::TcpStream;
use tracing::{debug, info, warn};
use visage_protocol::ServoCommand;
use visage_protocol::frame::encode_frame;

/// 舵机控制客户端
///
/// 状态只有两个：`Disconnected`（`stream` 为 `None`）和 `Connected`。
/// 所有方法在所有路径上都维持这一不变量，包括失败路径。
#[derive(Debug, Default)]
pub struct ServoClient {
    stream: Option<TcpStream>,
}

impl ServoClient {
    /// 创建未连接的客户端
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试建立连接
    ///
    /// 失败时保持/回到 Disconnected 并记录，不向调用方抛出。
    /// 已连接时先释放旧连接再重连。
    pub fn connect(&mut self, host: &str, port: u16) {
        self.close();

        match TcpStream::connect((host, port)) {
            Ok(stream) => {
                info!(host, port, "Connected to servo endpoint");
                self.stream = Some(stream);
            }
            Err(e) => {
                warn!(host, port, error = %e, "Failed to connect to servo endpoint");
                self.stream = None;
            }
        }
    }

    /// 是否处于 Connected 状态
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// 发送一批命令（编码为单个帧）
    ///
    /// 空批不产生任何写入。
    pub fn send_commands(&mut self, commands: &[ServoCommand]) {
        if commands.is_empty() {
            return;
        }
        self.send_frame(&encode_frame(commands));
    }

    /// 发送一个已编码的帧
    ///
    /// Disconnected 时是带日志的空操作；写失败时降级到 Disconnected
    /// 并记录，本帧丢弃。
    pub fn send_frame(&mut self, frame: &str) {
        let Some(stream) = &mut self.stream else {
            debug!(frame = frame.trim_end(), "Not connected to servo endpoint, frame dropped");
            return;
        };

        if let Err(e) = stream.write_all(frame.as_bytes()) {
            warn!(error = %e, "Failed to send command frame, disconnecting");
            self.close();
        }
    }

    /// 释放连接
    ///
    /// 幂等：任何状态下都可调用，包括失败之后和多次调用。
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            info!("Servo endpoint connection closed");
        }
    }
}

impl Drop for ServoClient {
    fn drop(&mut self) {
        self.close();
    }
}
