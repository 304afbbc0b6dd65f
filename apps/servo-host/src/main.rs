//! 舵机执行端点守护进程
//!
//! 监听跟踪客户端的命令帧，解码后交给执行后端。当前后端是模拟
//! 实现：记录每条命令并维护各通道最后角度，替换为硬件驱动即可
//! 驱动真实舵机。
//!
//! ```bash
//! visage_servo_host --host 0.0.0.0 --port 8888
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::Ordering;
use tracing::info;
use visage_server::{Dispatcher, ServoServer, SimulatedBackend};

/// 舵机执行端点
#[derive(Parser, Debug)]
#[command(name = "visage_servo_host")]
#[command(about = "Servo actuation endpoint for Visage animatronic faces", long_about = None)]
#[command(version)]
struct Args {
    /// 监听地址
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// 监听端口
    #[arg(long, default_value_t = 8888)]
    port: u16,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("visage_servo_host=info".parse().unwrap())
                .add_directive("visage_server=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let backend = SimulatedBackend::new();
    let angle_table = backend.angle_table();
    let dispatcher = Dispatcher::spawn(Box::new(backend));

    let server = ServoServer::bind(&format!("{}:{}", args.host, args.port))
        .with_context(|| format!("Failed to bind {}:{}", args.host, args.port))?;

    // Ctrl-C 清除运行标志，接受循环随后退出
    let shutdown = server.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Shutdown requested");
        shutdown.store(false, Ordering::Release);
    })
    .context("Failed to install Ctrl-C handler")?;

    server.run(dispatcher.sender());

    // 接受循环已停。存活的连接线程可能仍持有发送端，不等待汇合，
    // 分发线程在通道关闭后自行退出
    drop(dispatcher);

    // 收尾报告：各通道最后写入的角度
    let table = angle_table.lock();
    let mut entries: Vec<_> = table.iter().collect();
    entries.sort_by_key(|(id, _)| **id);
    for (id, angle) in entries {
        info!(servo = id, angle, "Final servo angle");
    }

    Ok(())
}
