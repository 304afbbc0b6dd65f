//! 舵机通道角度范围表
//!
//! 每个通道对应面部机构上的一个物理舵机。除标注外，角度均为正上负下，
//! 初始角度为 0。该表是固定配置，客户端映射与服务端校验共用同一份。

/// 舵机通道总数
pub const SERVO_COUNT: usize = 20;

/// 各通道的合法角度范围 `(id, (min, max))`，按 id 升序
pub const SERVO_RANGES: [(u8, (i32, i32)); SERVO_COUNT] = [
    (1, (0, 63)),    // 左下眼皮（小闭大张）
    (2, (-45, 63)),  // 牙后左上
    (3, (-27, 45)),  // 牙后左下
    (4, (-36, 27)),  // 下颚左
    (5, (-45, 18)),  // 上颚左
    (6, (0, 58)),    // 左嘴（小闭大张，左右嘴的角度必须相同）
    (7, (-27, 36)),  // 右后牙上
    (8, (-27, 45)),  // 右后牙下
    (9, (-36, 36)),  // 下颚右
    (10, (-27, 63)), // 上颚右
    (11, (-36, 36)), // 眼左右（右负左正）
    (12, (-22, 49)), // 眼上下
    (13, (0, 58)),   // 右嘴（小闭大张，左右嘴的角度必须相同）
    (14, (0, 90)),   // 左上眼皮（小闭大张）
    (15, (0, 81)),   // 右上眼皮（小闭大张）
    (16, (0, 63)),   // 右下眼皮（小闭大张）
    (17, (-40, 40)), // 右眉头
    (18, (-45, 36)), // 右眉尾
    (19, (-40, 40)), // 左眉头
    (20, (-45, 27)), // 左眉尾
];

/// 查询通道的合法角度范围
///
/// # 返回
/// - `Some((min, max))` - 通道存在
/// - `None` - 未知通道 id
pub fn angle_range(id: u8) -> Option<(i32, i32)> {
    SERVO_RANGES
        .iter()
        .find(|(servo_id, _)| *servo_id == id)
        .map(|(_, range)| *range)
}

/// 检查通道 id 是否在范围表中
pub fn is_known_channel(id: u8) -> bool {
    angle_range(id).is_some()
}
