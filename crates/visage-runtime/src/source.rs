//! 检测器边界：信号源
//!
//! 视觉检测器是外部黑盒：图像进，命名分数集出。核心只消费检测结果，
//! 所以这里把上游抽象为 [`SignalSource`]：每个采集周期产出一次
//! [`Detection`]，流结束时产出 `None`。
//!
//! 自带两种实现：
//!
//! - [`StaticSource`]：单次检测（JSON 文件，一个名称 → 分数对象）
//! - [`JsonlSource`]：检测流（每行一个 JSON 对象；`null` 行表示该
//!   周期未检测到人脸）

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::warn;
use visage_mapper::BlendShapes;

/// 信号源错误类型
#[derive(Error, Debug)]
pub enum SourceError {
    /// 文件读取失败
    #[error("Failed to read signal source: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析失败
    #[error("Failed to parse detection: {0}")]
    Json(#[from] serde_json::Error),
}

/// 一个采集周期的检测结果
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// 检测到人脸，附带信号集合
    Face(BlendShapes),
    /// 本周期无人脸：跳过映射与发送，不扰动舵机状态
    NoFace,
}

/// 检测器边界
///
/// 每次调用产出一个周期的检测结果；`None` 表示流结束。
pub trait SignalSource {
    /// 取下一个周期的检测结果
    fn next_detection(&mut self) -> Option<Detection>;
}

/// 把一段 JSON 文本解析为检测结果
///
/// `null` → 无人脸；对象 → 信号集合。
fn parse_detection(text: &str) -> Result<Detection, SourceError> {
    let scores: Option<HashMap<String, f32>> = serde_json::from_str(text)?;
    Ok(match scores {
        Some(scores) => Detection::Face(scores.into_iter().collect()),
        None => Detection::NoFace,
    })
}

/// 单次检测源（单张图片模式）
///
/// 产出一次检测结果后即结束。
#[derive(Debug)]
pub struct StaticSource {
    detection: Option<Detection>,
}

impl StaticSource {
    /// 从 JSON 文件加载
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            detection: Some(parse_detection(&content)?),
        })
    }

    /// 直接由检测结果构造
    pub fn new(detection: Detection) -> Self {
        Self {
            detection: Some(detection),
        }
    }
}

impl SignalSource for StaticSource {
    fn next_detection(&mut self) -> Option<Detection> {
        self.detection.take()
    }
}

/// 行式检测流源（摄像头/视频模式的录制格式）
///
/// 每行一个周期。空行跳过；无法解析的行告警后按无人脸处理，
/// 不中断流中其余周期。
pub struct JsonlSource<R: BufRead> {
    reader: R,
    line: u64,
}

impl JsonlSource<BufReader<File>> {
    /// 从 JSONL 文件打开
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlSource<R> {
    /// 从任意按行读取器构造（标准输入、管道等）
    pub fn from_reader(reader: R) -> Self {
        Self { reader, line: 0 }
    }
}

impl<R: BufRead> SignalSource for JsonlSource<R> {
    fn next_detection(&mut self) -> Option<Detection> {
        loop {
            let mut buf = String::new();
            match self.reader.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let text = buf.trim();
                    if text.is_empty() {
                        continue;
                    }
                    return Some(match parse_detection(text) {
                        Ok(detection) => detection,
                        Err(e) => {
                            warn!(line = self.line, error = %e, "Bad detection line, treated as no face");
                            Detection::NoFace
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Signal source read error, stream ends");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_face_detection() {
        let detection = parse_detection(r#"{"jawOpen": 0.8, "eyeBlinkLeft": 0.1}"#).unwrap();
        match detection {
            Detection::Face(shapes) => {
                assert_eq!(shapes.get("jawOpen"), 0.8);
                assert_eq!(shapes.get("eyeBlinkLeft"), 0.1);
            }
            Detection::NoFace => panic!("expected a face"),
        }
    }

    #[test]
    fn test_parse_null_is_no_face() {
        assert_eq!(parse_detection("null").unwrap(), Detection::NoFace);
    }

    #[test]
    fn test_static_source_yields_once() {
        let mut source = StaticSource::new(Detection::NoFace);
        assert_eq!(source.next_detection(), Some(Detection::NoFace));
        assert_eq!(source.next_detection(), None);
    }

    #[test]
    fn test_static_source_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"jawOpen": 0.5}"#).unwrap();

        let mut source = StaticSource::from_json_file(file.path()).unwrap();
        match source.next_detection() {
            Some(Detection::Face(shapes)) => assert_eq!(shapes.get("jawOpen"), 0.5),
            other => panic!("unexpected detection: {:?}", other),
        }
    }

    #[test]
    fn test_jsonl_stream() {
        let data = "{\"jawOpen\": 0.8}\nnull\n\n{\"jawOpen\": 0.2}\n";
        let mut source = JsonlSource::from_reader(Cursor::new(data));

        assert!(matches!(source.next_detection(), Some(Detection::Face(_))));
        assert_eq!(source.next_detection(), Some(Detection::NoFace));
        // 空行被跳过，直接到下一个对象
        assert!(matches!(source.next_detection(), Some(Detection::Face(_))));
        assert_eq!(source.next_detection(), None);
    }

    #[test]
    fn test_jsonl_bad_line_is_no_face() {
        let data = "not json\n{\"jawOpen\": 1.0}\n";
        let mut source = JsonlSource::from_reader(Cursor::new(data));

        assert_eq!(source.next_detection(), Some(Detection::NoFace));
        assert!(matches!(source.next_detection(), Some(Detection::Face(_))));
    }
}
