//! 控制循环
//!
//! 一个处理周期 = 检测 → 平滑/映射 → 编码 → 发送。客户端与引擎由
//! 调用方构造后借入循环，循环本身不持有连接或平滑状态。发送是
//! 尽力而为，端点不可达时周期照常推进。

use crate::pacer::{MIN_SLEEP, SkipGate, compensated_sleep};
use crate::source::{Detection, SignalSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use visage_client::ServoClient;
use visage_mapper::MapperEngine;

/// 处理一个周期的检测结果
///
/// 无人脸的周期整体跳过：不映射、不发送、不扰动舵机状态。
fn process_detection(detection: Detection, engine: &mut MapperEngine, client: &mut ServoClient) {
    match detection {
        Detection::Face(shapes) => {
            let batch = engine.map_cycle(&shapes);
            client.send_commands(&batch);
        }
        Detection::NoFace => {
            debug!("No face detected, cycle skipped");
        }
    }
}

/// 单次模式：跑一个周期后结束
pub fn run_single(
    source: &mut dyn SignalSource,
    engine: &mut MapperEngine,
    client: &mut ServoClient,
) {
    if let Some(detection) = source.next_detection() {
        process_detection(detection, engine, client);
    }
}

/// 实时模式：按跳帧门限限制处理频率
///
/// 源产出的帧到达过快时被原样丢弃（不排队）。源结束或 `running`
/// 被清除时返回。
pub fn run_live(
    source: &mut dyn SignalSource,
    engine: &mut MapperEngine,
    client: &mut ServoClient,
    interval: Duration,
    running: &AtomicBool,
) {
    let mut gate = SkipGate::new(interval);
    let mut processed: u64 = 0;
    let mut skipped: u64 = 0;

    while running.load(Ordering::Acquire) {
        let Some(detection) = source.next_detection() else {
            break;
        };

        if !gate.admit(Instant::now()) {
            skipped += 1;
            continue;
        }

        process_detection(detection, engine, client);
        processed += 1;
    }

    info!(processed, skipped, "Live loop finished");
}

/// 录制模式：测量周期耗时，睡掉非负余量
///
/// 处理耗时超过间隔时不补偿，下一周期立即开始。
pub fn run_recorded(
    source: &mut dyn SignalSource,
    engine: &mut MapperEngine,
    client: &mut ServoClient,
    interval: Duration,
    running: &AtomicBool,
) {
    let started = Instant::now();
    let mut processed: u64 = 0;

    while running.load(Ordering::Acquire) {
        let cycle_start = Instant::now();
        let Some(detection) = source.next_detection() else {
            break;
        };

        process_detection(detection, engine, client);
        processed += 1;

        let cost = cycle_start.elapsed();
        spin_sleep::sleep(compensated_sleep(interval, cost, MIN_SLEEP));
    }

    let elapsed = started.elapsed().as_secs_f64();
    let actual_fps = if elapsed > 0.0 { processed as f64 / elapsed } else { 0.0 };
    info!(processed, actual_fps, "Recorded stream finished");
}
