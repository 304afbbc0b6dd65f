//! 每周期的信号集合
//!
//! 检测器每个采集周期产出一组命名强度分数（BlendShape），
//! 分数范围 [0, 1]。集合是临时数据，每周期重建。

use std::collections::HashMap;

/// 一个周期的 BlendShape 信号集合
///
/// 查询不存在的名称返回 0.0，永远不是错误：检测器省略的信号
/// 等价于强度为零。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlendShapes {
    scores: HashMap<String, f32>,
}

impl BlendShapes {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询信号分数，缺失时返回 0.0
    pub fn get(&self, name: &str) -> f32 {
        self.scores.get(name).copied().unwrap_or(0.0)
    }

    /// 写入信号分数
    pub fn set(&mut self, name: impl Into<String>, score: f32) {
        self.scores.insert(name.into(), score);
    }

    /// 信号数量
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// 遍历所有信号
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.scores.iter().map(|(name, &score)| (name.as_str(), score))
    }
}

impl FromIterator<(String, f32)> for BlendShapes {
    fn from_iter<T: IntoIterator<Item = (String, f32)>>(iter: T) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, f32); N]> for BlendShapes {
    fn from(pairs: [(&str, f32); N]) -> Self {
        pairs.into_iter().map(|(name, score)| (name.to_string(), score)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_name_reads_zero() {
        let shapes = BlendShapes::new();
        assert_eq!(shapes.get("jawOpen"), 0.0);
    }

    #[test]
    fn test_set_and_get() {
        let mut shapes = BlendShapes::new();
        shapes.set("jawOpen", 0.8);
        assert_eq!(shapes.get("jawOpen"), 0.8);
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn test_from_pairs() {
        let shapes = BlendShapes::from([("eyeLookUpLeft", 0.8), ("eyeLookUpRight", 0.2)]);
        assert_eq!(shapes.get("eyeLookUpLeft"), 0.8);
        assert_eq!(shapes.get("eyeLookUpRight"), 0.2);
        assert_eq!(shapes.get("eyeLookDownLeft"), 0.0);
    }
}
