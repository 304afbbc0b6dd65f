//! 舵机通道描述符表
//!
//! 每个通道是一条静态描述符：通道 id、驱动它的信号组合方式、
//! 灵敏度键。合法角度范围来自 `visage-protocol` 的范围表，映射层与
//! 线协议共用同一份数据。
//!
//! 描述符表取代了按名称查找处理函数的动态分发：引擎直接按 id 升序
//! 遍历配置的活动子集。

use crate::engine::Sensitivity;
use crate::mapping::range_map;
use crate::shapes::BlendShapes;
use visage_protocol::ranges::angle_range;

/// 单信号映射的目标半边
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 映射到 `[0, max]`
    TowardMax,
    /// 映射到 `[0, min]`
    TowardMin,
}

/// 对向信号组的一侧
///
/// 双侧信号（同一方向线索的左右眼实例）先经 `max()` 合并成该方向的
/// 单一强度，再参与方向比较。
#[derive(Debug, Clone, Copy)]
pub struct OpposedSide {
    /// 该方向的信号名（1 个或 2 个）
    pub signals: &'static [&'static str],
    /// 灵敏度键
    pub sensitivity: &'static str,
}

impl OpposedSide {
    /// 合并后的方向强度（未乘灵敏度）
    fn strength(&self, shapes: &BlendShapes) -> f32 {
        self.signals.iter().map(|name| shapes.get(name)).fold(0.0, f32::max)
    }
}

/// 通道的驱动方式
///
/// 四种组合方式共用同一个范围映射原语，只在输入来源和目标半边上
/// 有区别。
#[derive(Debug, Clone, Copy)]
pub enum Drive {
    /// 单信号仿射映射到整个通道范围
    ///
    /// `domain` 是该通道对输入信号的解释区间，大多数通道为 `[0, 1]`，
    /// 个别通道使用收窄的区间（如嘴部通道的 `[0.01, 0.8]`）。
    Affine {
        signal: &'static str,
        domain: (f32, f32),
        sensitivity: &'static str,
    },

    /// 单信号映射到通道范围的半边，中立位为 0
    HalfRange {
        signal: &'static str,
        toward: Direction,
        sensitivity: &'static str,
    },

    /// 对向信号组：同一轴上的两个相反方向竞争
    ///
    /// 强度严格较大的方向胜出（相等时取正方向），胜出方向映射到
    /// 对应半边，产出围绕中立零点的有符号角度。
    Opposed { positive: OpposedSide, negative: OpposedSide },

    /// 反相信号：`value = max(0, pivot - score)`，定义域 `[0, pivot]`
    ///
    /// 眼皮通道使用：闭眼分数越高，张开角度越小。
    Inverted {
        signal: &'static str,
        pivot: f32,
        sensitivity: &'static str,
    },
}

/// 舵机通道描述符
#[derive(Debug, Clone, Copy)]
pub struct ServoChannel {
    /// 通道 id（与范围表一致）
    pub id: u8,
    /// 驱动方式
    pub drive: Drive,
}

impl ServoChannel {
    /// 由当前信号集合计算目标角度（浮点，未截断）
    ///
    /// 输出保证落在通道的合法角度范围内：所有路径都经过
    /// [`range_map`]，夹紧发生在缩放之前。
    pub fn target_angle(&self, shapes: &BlendShapes, sensitivity: &Sensitivity) -> f32 {
        // 描述符表与范围表同源，id 一定存在
        let (min, max) = angle_range(self.id).unwrap_or((0, 0));
        let (min, max) = (min as f32, max as f32);

        match &self.drive {
            Drive::Affine { signal, domain, sensitivity: key } => {
                let value = shapes.get(signal) * sensitivity.get(key);
                range_map(value, domain.0, domain.1, min, max)
            }

            Drive::HalfRange { signal, toward, sensitivity: key } => {
                let value = shapes.get(signal) * sensitivity.get(key);
                match toward {
                    Direction::TowardMax => range_map(value, 0.0, 1.0, 0.0, max),
                    Direction::TowardMin => range_map(value, 0.0, 1.0, 0.0, min),
                }
            }

            Drive::Opposed { positive, negative } => {
                let pos = positive.strength(shapes);
                let neg = negative.strength(shapes);

                // 相等时取正方向
                if pos >= neg {
                    let value = pos * sensitivity.get(positive.sensitivity);
                    range_map(value, 0.0, 1.0, 0.0, max)
                } else {
                    let value = neg * sensitivity.get(negative.sensitivity);
                    range_map(value, 0.0, 1.0, 0.0, min)
                }
            }

            Drive::Inverted { signal, pivot, sensitivity: key } => {
                let value = (pivot - shapes.get(signal)).max(0.0) * sensitivity.get(key);
                range_map(value, 0.0, *pivot, min, max)
            }
        }
    }
}

/// 全部 20 个通道的描述符，按 id 升序
///
/// 信号接线与灵敏度键沿用面部机构的既有标定。
pub const CHANNELS: [ServoChannel; visage_protocol::SERVO_COUNT] = [
    // 左下眼皮
    ServoChannel {
        id: 1,
        drive: Drive::Inverted { signal: "eyeBlinkLeft", pivot: 0.5, sensitivity: "eyelid_left_close" },
    },
    // 牙后左上（脸皮上下）
    ServoChannel {
        id: 2,
        drive: Drive::Affine { signal: "cheekSquintLeft", domain: (0.0, 1.0), sensitivity: "cheek_left_up" },
    },
    // 牙后左下（脸皮前后）
    ServoChannel {
        id: 3,
        drive: Drive::Affine { signal: "mouthStretchLeft", domain: (0.0, 1.0), sensitivity: "cheek_left_forward" },
    },
    // 下颚左
    ServoChannel {
        id: 4,
        drive: Drive::Affine { signal: "jawLeft", domain: (0.0, 1.0), sensitivity: "jaw_open" },
    },
    // 上颚左
    ServoChannel {
        id: 5,
        drive: Drive::Affine { signal: "jawOpen", domain: (0.0, 1.0), sensitivity: "jaw_open" },
    },
    // 左嘴：jawOpen 在收窄的定义域上解释
    ServoChannel {
        id: 6,
        drive: Drive::Affine { signal: "jawOpen", domain: (0.01, 0.8), sensitivity: "jaw_open" },
    },
    // 右后牙上（脸皮上下）
    ServoChannel {
        id: 7,
        drive: Drive::Affine { signal: "cheekSquintRight", domain: (0.0, 1.0), sensitivity: "cheek_right_up" },
    },
    // 右后牙下（脸皮前后）
    ServoChannel {
        id: 8,
        drive: Drive::Affine { signal: "mouthStretchRight", domain: (0.0, 1.0), sensitivity: "cheek_right_forward" },
    },
    // 下颚右
    ServoChannel {
        id: 9,
        drive: Drive::Affine { signal: "jawRight", domain: (0.0, 1.0), sensitivity: "jaw_open" },
    },
    // 上颚右
    ServoChannel {
        id: 10,
        drive: Drive::Affine { signal: "jawOpen", domain: (0.0, 1.0), sensitivity: "jaw_open" },
    },
    // 眼球左右（右负左正）
    ServoChannel {
        id: 11,
        drive: Drive::Opposed {
            positive: OpposedSide {
                signals: &["eyeLookOutLeft", "eyeLookInRight"],
                sensitivity: "eye_left",
            },
            negative: OpposedSide {
                signals: &["eyeLookOutRight", "eyeLookInLeft"],
                sensitivity: "eye_right",
            },
        },
    },
    // 眼球上下（正上负下）
    ServoChannel {
        id: 12,
        drive: Drive::Opposed {
            positive: OpposedSide {
                signals: &["eyeLookUpLeft", "eyeLookUpRight"],
                sensitivity: "eye_up",
            },
            negative: OpposedSide {
                signals: &["eyeLookDownLeft", "eyeLookDownRight"],
                sensitivity: "eye_down",
            },
        },
    },
    // 右嘴：与左嘴相同的接线，角度必须一致
    ServoChannel {
        id: 13,
        drive: Drive::Affine { signal: "jawOpen", domain: (0.01, 0.8), sensitivity: "jaw_open" },
    },
    // 左上眼皮
    ServoChannel {
        id: 14,
        drive: Drive::Inverted { signal: "eyeBlinkLeft", pivot: 0.5, sensitivity: "eyelid_left_close" },
    },
    // 右上眼皮
    ServoChannel {
        id: 15,
        drive: Drive::Inverted { signal: "eyeBlinkRight", pivot: 0.5, sensitivity: "eyelid_right_close" },
    },
    // 右下眼皮
    ServoChannel {
        id: 16,
        drive: Drive::Inverted { signal: "eyeBlinkRight", pivot: 0.5, sensitivity: "eyelid_right_close" },
    },
    // 右眉头：下降映射到负半边
    ServoChannel {
        id: 17,
        drive: Drive::HalfRange {
            signal: "browDownRight",
            toward: Direction::TowardMin,
            sensitivity: "eyebrow_right_down",
        },
    },
    // 右眉尾：上升映射到正半边
    ServoChannel {
        id: 18,
        drive: Drive::HalfRange {
            signal: "browOuterUpRight",
            toward: Direction::TowardMax,
            sensitivity: "eyebrow_right_up",
        },
    },
    // 左眉头
    ServoChannel {
        id: 19,
        drive: Drive::HalfRange {
            signal: "browDownLeft",
            toward: Direction::TowardMin,
            sensitivity: "eyebrow_left_down",
        },
    },
    // 左眉尾
    ServoChannel {
        id: 20,
        drive: Drive::HalfRange {
            signal: "browOuterUpLeft",
            toward: Direction::TowardMax,
            sensitivity: "eyebrow_left_up",
        },
    },
];

/// 按 id 查找通道描述符
pub fn channel(id: u8) -> Option<&'static ServoChannel> {
    CHANNELS.iter().find(|ch| ch.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_protocol::SERVO_RANGES;

    fn sens() -> Sensitivity {
        Sensitivity::default()
    }

    #[test]
    fn test_table_covers_all_range_ids() {
        for (id, _) in SERVO_RANGES {
            assert!(channel(id).is_some(), "servo {} has no descriptor", id);
        }
        assert!(channel(0).is_none());
        assert!(channel(21).is_none());
    }

    #[test]
    fn test_affine_full_range() {
        // 通道 2：cheekSquintLeft ∈ [0, 1] → (-45, 63)
        let ch = channel(2).unwrap();
        let low = ch.target_angle(&BlendShapes::from([("cheekSquintLeft", 0.0)]), &sens());
        let high = ch.target_angle(&BlendShapes::from([("cheekSquintLeft", 1.0)]), &sens());
        assert_eq!(low, -45.0);
        assert_eq!(high, 63.0);
    }

    #[test]
    fn test_mouth_domain_override() {
        // 通道 6：jawOpen ∈ [0.01, 0.8] → [0, 58]
        let ch = channel(6).unwrap();
        assert_eq!(ch.target_angle(&BlendShapes::from([("jawOpen", 0.01)]), &sens()), 0.0);
        assert_eq!(ch.target_angle(&BlendShapes::from([("jawOpen", 0.8)]), &sens()), 58.0);
        // 定义域外饱和
        assert_eq!(ch.target_angle(&BlendShapes::from([("jawOpen", 0.95)]), &sens()), 58.0);
        assert_eq!(ch.target_angle(&BlendShapes::from([("jawOpen", 0.0)]), &sens()), 0.0);
    }

    #[test]
    fn test_mouth_channels_match() {
        // 左右嘴接线相同，任意输入下角度一致
        let left = channel(6).unwrap();
        let right = channel(13).unwrap();
        for jaw in [0.0, 0.2, 0.5, 0.8, 1.0] {
            let shapes = BlendShapes::from([("jawOpen", jaw)]);
            assert_eq!(left.target_angle(&shapes, &sens()), right.target_angle(&shapes, &sens()));
        }
    }

    #[test]
    fn test_opposed_dominant_up() {
        // 通道 12：eyeLookUpLeft=0.8, eyeLookUpRight=0.2 → 向上 0.8 → 39.2
        let ch = channel(12).unwrap();
        let shapes = BlendShapes::from([("eyeLookUpLeft", 0.8), ("eyeLookUpRight", 0.2)]);
        let angle = ch.target_angle(&shapes, &sens());
        assert!((angle - 39.2).abs() < 1e-5);
    }

    #[test]
    fn test_opposed_dominant_down() {
        // 向下 0.8 胜出 → 映射到负半边：0.8 * (-22) = -17.6
        let ch = channel(12).unwrap();
        let shapes = BlendShapes::from([("eyeLookUpLeft", 0.2), ("eyeLookDownLeft", 0.8)]);
        let angle = ch.target_angle(&shapes, &sens());
        assert!((angle - (-17.6)).abs() < 1e-5);
    }

    #[test]
    fn test_opposed_tie_goes_positive() {
        let ch = channel(12).unwrap();
        let shapes = BlendShapes::from([("eyeLookUpLeft", 0.5), ("eyeLookDownLeft", 0.5)]);
        let angle = ch.target_angle(&shapes, &sens());
        // 相等取正方向：0.5 * 49 = 24.5
        assert!((angle - 24.5).abs() < 1e-5);
    }

    #[test]
    fn test_opposed_neutral_rest() {
        // 无信号时角度为中立零点，而不是半边端点
        let ch = channel(11).unwrap();
        assert_eq!(ch.target_angle(&BlendShapes::new(), &sens()), 0.0);
        let ch = channel(12).unwrap();
        assert_eq!(ch.target_angle(&BlendShapes::new(), &sens()), 0.0);
    }

    #[test]
    fn test_opposed_bilateral_max() {
        // 左眼外展与右眼内收取较大者
        let ch = channel(11).unwrap();
        let shapes = BlendShapes::from([("eyeLookOutLeft", 0.3), ("eyeLookInRight", 0.6)]);
        let angle = ch.target_angle(&shapes, &sens());
        assert!((angle - 0.6 * 36.0).abs() < 1e-5);
    }

    #[test]
    fn test_inverted_eyelid() {
        // 通道 14：睁眼（blink=0）→ 90，闭眼过半（blink>=0.5）→ 0
        let ch = channel(14).unwrap();
        assert_eq!(ch.target_angle(&BlendShapes::from([("eyeBlinkLeft", 0.0)]), &sens()), 90.0);
        assert_eq!(ch.target_angle(&BlendShapes::from([("eyeBlinkLeft", 0.5)]), &sens()), 0.0);
        assert_eq!(ch.target_angle(&BlendShapes::from([("eyeBlinkLeft", 0.9)]), &sens()), 0.0);

        let half = ch.target_angle(&BlendShapes::from([("eyeBlinkLeft", 0.25)]), &sens());
        assert_eq!(half, 45.0);
    }

    #[test]
    fn test_halfrange_brow() {
        // 通道 17：browDownRight → [0, -40]
        let ch = channel(17).unwrap();
        assert_eq!(ch.target_angle(&BlendShapes::from([("browDownRight", 1.0)]), &sens()), -40.0);
        assert_eq!(ch.target_angle(&BlendShapes::from([("browDownRight", 0.5)]), &sens()), -20.0);
        assert_eq!(ch.target_angle(&BlendShapes::new(), &sens()), 0.0);

        // 通道 18：browOuterUpRight → [0, 36]
        let ch = channel(18).unwrap();
        assert_eq!(ch.target_angle(&BlendShapes::from([("browOuterUpRight", 1.0)]), &sens()), 36.0);
    }

    #[test]
    fn test_sensitivity_scales_before_mapping() {
        let mut sensitivity = Sensitivity::default();
        sensitivity.set("eyebrow_right_up", 2.0);

        let ch = channel(18).unwrap();
        let shapes = BlendShapes::from([("browOuterUpRight", 0.25)]);
        // 0.25 * 2.0 = 0.5 → 18.0
        assert_eq!(ch.target_angle(&shapes, &sensitivity), 18.0);

        // 放大后超出定义域的输入被夹紧，而不是超出范围
        let shapes = BlendShapes::from([("browOuterUpRight", 0.8)]);
        assert_eq!(ch.target_angle(&shapes, &sensitivity), 36.0);
    }

    #[test]
    fn test_all_channels_stay_within_range() {
        // 极端输入下每个通道的输出都不越界
        let all_high: BlendShapes = CHANNELS
            .iter()
            .flat_map(|ch| match &ch.drive {
                Drive::Affine { signal, .. }
                | Drive::HalfRange { signal, .. }
                | Drive::Inverted { signal, .. } => vec![*signal],
                Drive::Opposed { positive, negative } => {
                    positive.signals.iter().chain(negative.signals).copied().collect()
                }
            })
            .map(|name| (name.to_string(), 1.0))
            .collect();

        for shapes in [BlendShapes::new(), all_high] {
            for ch in &CHANNELS {
                let (min, max) = visage_protocol::angle_range(ch.id).unwrap();
                let angle = ch.target_angle(&shapes, &sens());
                assert!(
                    angle >= min as f32 && angle <= max as f32,
                    "servo {} angle {} outside ({}, {})",
                    ch.id,
                    angle,
                    min,
                    max
                );
            }
        }
    }
}
