//! # Visage CLI
//!
//! 面部跟踪客户端命令行工具
//!
//! ## 模式
//!
//! ```bash
//! # 单次模式：处理一个检测结果文件
//! visage-cli once tests/face.json
//!
//! # 实时模式：从标准输入消费检测流（跳帧限速）
//! detector | visage-cli live
//!
//! # 录制模式：按目标帧率回放检测流
//! visage-cli replay tests/session.jsonl
//!
//! # 通讯测试：向端点发送随机命令批
//! visage-cli stress --batches 100
//! ```
//!
//! 检测流是 JSONL：每行一个 `{"signal": score, ...}` 对象，`null`
//! 行表示该周期未检测到人脸。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use visage_client::ServoClient;
use visage_mapper::MapperEngine;
use visage_runtime::{Config, JsonlSource, StaticSource, run_live, run_recorded, run_single};

mod stress;

/// Visage CLI - 动画面部跟踪客户端
#[derive(Parser, Debug)]
#[command(name = "visage-cli")]
#[command(about = "Tracking client for Visage animatronic faces", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（TOML；省略时使用内置默认值）
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 单次模式：处理一个检测结果文件
    Once {
        /// 检测结果 JSON 文件
        input: PathBuf,
    },

    /// 实时模式：消费检测流，跳帧限速
    Live {
        /// 从文件读取检测流（省略时读标准输入）
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// 录制模式：按目标帧率回放检测流
    Replay {
        /// 检测流 JSONL 文件
        input: PathBuf,
    },

    /// 通讯测试：发送随机的范围内命令批
    Stress {
        /// 批次数
        #[arg(long, default_value_t = 100)]
        batches: u32,

        /// 批间间隔（毫秒）
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

/// 安装 Ctrl-C 处理：清除运行标志
fn install_stop_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::Release);
    })
    .context("Failed to install Ctrl-C handler")?;
    Ok(running)
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("visage_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    // 配置错误在启动期致命
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let mut client = ServoClient::new();
    client.connect(&config.connection.host, config.connection.port);

    match cli.command {
        Commands::Once { input } => {
            let mut source = StaticSource::from_json_file(&input)
                .with_context(|| format!("Failed to load detection from {}", input.display()))?;
            let mut engine = MapperEngine::new(config.engine_config());
            run_single(&mut source, &mut engine, &mut client);
        }

        Commands::Live { input } => {
            let running = install_stop_flag()?;
            let mut engine = MapperEngine::new(config.engine_config());
            let interval = config.cycle_interval();

            match input {
                Some(path) => {
                    let mut source = JsonlSource::from_path(&path)
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    run_live(&mut source, &mut engine, &mut client, interval, &running);
                }
                None => {
                    info!("Reading detection stream from stdin");
                    let mut source = JsonlSource::from_reader(std::io::stdin().lock());
                    run_live(&mut source, &mut engine, &mut client, interval, &running);
                }
            }
        }

        Commands::Replay { input } => {
            let running = install_stop_flag()?;
            let mut source = JsonlSource::from_path(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let mut engine = MapperEngine::new(config.engine_config());
            run_recorded(&mut source, &mut engine, &mut client, config.cycle_interval(), &running);
        }

        Commands::Stress { batches, interval_ms } => {
            let running = install_stop_flag()?;
            stress::run(&mut client, batches, interval_ms, &running);
        }
    }

    client.close();
    Ok(())
}
