//! # Visage Server
//!
//! 舵机执行端点的传输服务端
//!
//! ## 结构
//!
//! - `server`: 接受循环与每连接读取线程（私有重组缓冲区）
//! - `backend`: 执行后端 trait、命令分发线程与模拟后端
//!
//! ## 并发模型
//!
//! 每条入站连接由一个独立线程服务，连接之间没有共享可变状态。
//! 所有连接解码出的命令汇入同一条无界通道，由单个分发线程按到达
//! 顺序交给执行后端：同一通道 id 的并发写入以到达序后写胜出，
//! 后端再慢也不会阻塞任何连接的读取。服务端从不回复任何帧。

pub mod backend;
pub mod server;

// 重新导出常用类型
pub use backend::{ActuationBackend, CommandSender, Dispatcher, SimulatedBackend};
pub use server::ServoServer;

use thiserror::Error;

/// 服务端错误类型
///
/// 只有启动期的失败是错误：运行期的连接级故障都被限制在单条连接内，
/// 以日志形式暴露。
#[derive(Error, Debug)]
pub enum ServerError {
    /// 监听地址绑定失败
    #[error("Failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}
