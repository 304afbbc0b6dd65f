//! 通讯测试
//!
//! 端点联调工具：对每个通道生成范围内的随机角度与随机运动时长，
//! 整表打包成一帧按固定节奏发送。用于不接检测器时验证端点链路。

use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;
use visage_client::ServoClient;
use visage_protocol::{SERVO_RANGES, ServoCommand};

/// 生成一批测试命令：每个通道一条，角度落在合法范围内
fn generate_batch(rng: &mut impl Rng) -> Vec<ServoCommand> {
    SERVO_RANGES
        .iter()
        .map(|&(id, (min, max))| {
            let angle = rng.gen_range(min..=max);
            let duration_ms = rng.gen_range(100..=500);
            ServoCommand::new(id, angle, duration_ms)
        })
        .collect()
}

/// 发送 `batches` 批测试数据，批间间隔 `interval_ms` 毫秒
pub fn run(client: &mut ServoClient, batches: u32, interval_ms: u64, running: &AtomicBool) {
    let mut rng = rand::thread_rng();
    let interval = Duration::from_millis(interval_ms);

    for batch_no in 1..=batches {
        if !running.load(Ordering::Acquire) {
            info!(sent = batch_no - 1, "Stress run interrupted");
            return;
        }

        let batch = generate_batch(&mut rng);
        info!(batch_no, commands = batch.len(), "Sending test batch");
        client.send_commands(&batch);

        std::thread::sleep(interval);
    }

    info!(sent = batches, "Stress run complete");
}
