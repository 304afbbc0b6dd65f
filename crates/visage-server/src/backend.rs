//! 执行后端与命令分发
//!
//! 后端是外部协作方：`apply` 假定非阻塞或有界延迟，失败是后端自己
//! 的事，不回传给核心。分发线程把多条连接的命令序列化成一条到达
//! 顺序流，后端永远只被单线程访问。

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, trace};
use visage_protocol::ServoCommand;

/// 执行后端边界
///
/// 每条有效命令按帧内出现顺序到达。不同连接之间不保证顺序，
/// 同一连接的帧序列内保证。
pub trait ActuationBackend: Send {
    /// 执行一条命令
    fn apply(&mut self, command: &ServoCommand);
}

/// 命令发送端
///
/// 连接线程持有的分发句柄。无界通道，发送从不阻塞读取线程。
pub type CommandSender = Sender<ServoCommand>;

/// 命令分发线程
///
/// 持有后端所有权，逐条取出命令调用 `apply`。所有发送端关闭后
/// 线程自行退出。
pub struct Dispatcher {
    sender: CommandSender,
    worker: Option<thread::JoinHandle<()>>,
}

impl Dispatcher {
    /// 启动分发线程
    pub fn spawn(mut backend: Box<dyn ActuationBackend>) -> Self {
        let (sender, receiver): (Sender<ServoCommand>, Receiver<ServoCommand>) = unbounded();

        let worker = thread::spawn(move || {
            for command in receiver.iter() {
                trace!(id = command.id, angle = command.angle, "Dispatching command");
                backend.apply(&command);
            }
            debug!("Dispatch channel closed, backend worker exiting");
        });

        Self { sender, worker: Some(worker) }
    }

    /// 获取一个命令发送端（每条连接克隆一个）
    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    /// 断开自己的发送端，排空队列后汇合分发线程
    ///
    /// 要求所有克隆出的发送端都已丢弃，否则会一直等待。连接线程
    /// 可能仍持有发送端时，直接 drop 即可（线程在通道关闭后自行
    /// 退出）。
    pub fn join(mut self) {
        let (orphan, _) = unbounded();
        self.sender = orphan;

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// 模拟执行后端
///
/// 真实部署中替换为硬件驱动。这里记录每条命令并维护各通道
/// 最后写入的角度表，便于观察与收尾报告。
#[derive(Default)]
pub struct SimulatedBackend {
    angles: Arc<Mutex<HashMap<u8, i32>>>,
}

impl SimulatedBackend {
    /// 创建模拟后端
    pub fn new() -> Self {
        Self::default()
    }

    /// 角度表句柄（最后写入胜出）
    pub fn angle_table(&self) -> Arc<Mutex<HashMap<u8, i32>>> {
        Arc::clone(&self.angles)
    }
}

impl ActuationBackend for SimulatedBackend {
    fn apply(&mut self, command: &ServoCommand) {
        info!(
            servo = command.id,
            angle = command.angle,
            duration_ms = command.duration_ms,
            "Applying servo command"
        );
        self.angles.lock().insert(command.id, command.angle);
    }
}
