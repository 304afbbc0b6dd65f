//! 接受循环与每连接读取线程
//!
//! 每条连接的状态机：Accepting → Reading ⇄ Dispatching → Closed。
//! 接受新连接时分配一个私有的空重组缓冲区；读到的字节追加进缓冲区，
//! 凑满一行就取出解码分发，剩余字节留待下次读取。对端断开或读错误
//! 只关闭这一条连接，其余连接不受影响。

use crate::ServerError;
use crate::backend::CommandSender;
use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use visage_protocol::FrameAssembler;
use visage_protocol::frame::decode_frame;

/// 接受循环空转时的轮询间隔
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 舵机执行端点服务器
pub struct ServoServer {
    listener: TcpListener,
    running: Arc<AtomicBool>,
}

impl ServoServer {
    /// 绑定监听地址
    ///
    /// 绑定失败属于启动期配置错误，对整个进程致命，向调用方返回。
    pub fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)?;
        // 非阻塞接受，轮询之间检查停止标志
        listener.set_nonblocking(true)?;
        info!(addr = %listener.local_addr()?, "Servo server listening");

        Ok(Self {
            listener,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// 实际监听地址（绑定端口 0 时由系统分配）
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// 停止标志句柄（ctrlc 等外部信号翻转）
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// 运行接受循环，直到停止标志被清除
    ///
    /// 每条接受的连接交给独立线程服务；连接线程在对端断开或读错误
    /// 时自行退出并释放连接资源。
    pub fn run(&self, dispatch: CommandSender) {
        while self.running.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!(%peer, "Client connected");
                    let dispatch = dispatch.clone();
                    thread::spawn(move || serve_connection(stream, peer, dispatch));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
        info!("Servo server accept loop stopped");
    }

    /// 请求停止接受循环
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// 服务单条连接，直到对端断开或读错误
///
/// 连接线程独占 `stream` 与重组缓冲区；函数返回即释放两者，
/// 所有退出路径一致。
fn serve_connection(mut stream: TcpStream, peer: SocketAddr, dispatch: CommandSender) {
    // 连接线程按阻塞读工作
    if let Err(e) = stream.set_nonblocking(false) {
        warn!(%peer, error = %e, "Failed to configure connection, closing");
        return;
    }

    let mut assembler = FrameAssembler::new();
    let mut buf = [0u8; 1024];

    loop {
        match stream.read(&mut buf) {
            Ok(0) => {
                info!(%peer, "Client disconnected");
                break;
            }
            Ok(n) => {
                assembler.push(&buf[..n]);
                while let Some(frame) = assembler.next_frame() {
                    match frame {
                        Ok(line) => dispatch_frame(&line, peer, &dispatch),
                        Err(e) => warn!(%peer, error = %e, "Dropping undecodable frame"),
                    }
                }
            }
            Err(e) => {
                warn!(%peer, error = %e, "Read error, closing connection");
                break;
            }
        }
    }
}

/// 解码一帧并分发其中的有效命令
///
/// 坏 token 与未知通道 id 记录后跳过，同帧其余命令照常分发，
/// 顺序保持帧内出现顺序。
fn dispatch_frame(line: &str, peer: SocketAddr, dispatch: &CommandSender) {
    for result in decode_frame(line) {
        let command = match result {
            Ok(command) => command,
            Err(e) => {
                warn!(%peer, error = %e, "Skipping malformed command token");
                continue;
            }
        };

        if let Err(e) = command.validate_channel() {
            warn!(%peer, error = %e, "Skipping command for unknown channel");
            continue;
        }

        if dispatch.send(command).is_err() {
            warn!(%peer, "Dispatcher is gone, command dropped");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use visage_protocol::ServoCommand;

    #[test]
    fn test_dispatch_frame_skips_bad_tokens() {
        let (tx, rx) = unbounded();
        let peer: SocketAddr = "127.0.0.1:9".parse().unwrap();

        // 坏 token 夹在好 token 之间
        dispatch_frame("abc 12,10,50", peer, &tx);
        let received: Vec<ServoCommand> = rx.try_iter().collect();
        assert_eq!(received, vec![ServoCommand::new(12, 10, 50)]);
    }

    #[test]
    fn test_dispatch_frame_skips_unknown_channel() {
        let (tx, rx) = unbounded();
        let peer: SocketAddr = "127.0.0.1:9".parse().unwrap();

        dispatch_frame("42,10,50 6,30,50", peer, &tx);
        let received: Vec<ServoCommand> = rx.try_iter().collect();
        assert_eq!(received, vec![ServoCommand::new(6, 30, 50)]);
    }

    #[test]
    fn test_dispatch_frame_preserves_order() {
        let (tx, rx) = unbounded();
        let peer: SocketAddr = "127.0.0.1:9".parse().unwrap();

        dispatch_frame("6,30,50 13,30,50 1,5,50", peer, &tx);
        let ids: Vec<u8> = rx.try_iter().map(|cmd| cmd.id).collect();
        assert_eq!(ids, vec![6, 13, 1]);
    }

    #[test]
    fn test_bind_and_local_addr() {
        let server = ServoServer::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_shutdown_stops_accept_loop() {
        let server = ServoServer::bind("127.0.0.1:0").unwrap();
        let shutdown = server.shutdown_handle();
        let (tx, _rx) = unbounded();

        let handle = thread::spawn(move || server.run(tx));
        thread::sleep(Duration::from_millis(100));
        shutdown.store(false, Ordering::Release);

        handle.join().unwrap();
    }
}
