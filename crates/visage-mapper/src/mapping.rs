//! 范围映射原语
//!
//! 所有通道的角度计算都建立在同一个原语上：先把输入夹入定义域，
//! 再做仿射缩放到值域。夹紧必须发生在缩放之前，否则饱和输入的
//! 行为会改变。

/// 把 `value` 从 `[from_min, from_max]` 映射到 `[to_min, to_max]`
///
/// 输入先被夹入 `[from_min, from_max]`，再线性缩放。值域允许
/// "倒置"（`to_min > to_max`），用于把信号映射到通道范围的负半边。
///
/// # 参数
/// - `value`: 输入值（超出定义域时静默夹紧，不是错误）
/// - `from_min` / `from_max`: 定义域，要求 `from_min < from_max`
/// - `to_min` / `to_max`: 值域
pub fn range_map(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    let clamped = value.clamp(from_min, from_max);
    let scaled = (clamped - from_min) / (from_max - from_min);
    to_min + scaled * (to_max - to_min)
}
