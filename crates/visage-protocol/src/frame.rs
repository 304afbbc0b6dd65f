//! 帧编码、容错解码与字节流重组
//!
//! 一帧是一行文本：若干命令以单个空格连接，行尾为单个 `\n`。
//! TCP 不保证一次 `read` 对应一帧，[`FrameAssembler`] 负责把任意切分的
//! 字节流重组为完整帧：一次写入可能跨越零帧、一帧或多帧；一帧也可能
//! 跨越多次读取。重组过程不丢弃、不重复、不重排字节。

use crate::ProtocolError;
use crate::command::ServoCommand;

/// 把一批命令编码为一个线帧
///
/// 命令以单个空格连接，并追加单个 `\n`。批内命令顺序由调用方保证
/// （映射层按活动通道 id 升序产出）。
pub fn encode_frame(commands: &[ServoCommand]) -> String {
    let mut frame = String::with_capacity(commands.len() * 10 + 1);
    for (i, cmd) in commands.iter().enumerate() {
        if i > 0 {
            frame.push(' ');
        }
        frame.push_str(&cmd.to_string());
    }
    frame.push('\n');
    frame
}

/// 容错解码一帧
///
/// 按空白切分为 token，逐个解析。单个 token 解析失败不影响同帧内
/// 其余 token，调用方对 `Err` 项记录日志后跳过即可。
pub fn decode_frame(line: &str) -> Vec<Result<ServoCommand, ProtocolError>> {
    line.split_whitespace().map(ServoCommand::parse).collect()
}

/// 字节流帧重组器
///
/// 每条连接持有一个私有实例。[`push`](FrameAssembler::push) 追加收到的
/// 字节，[`next_frame`](FrameAssembler::next_frame) 取出缓冲区中第一个
/// 完整帧（含 `\n` 之前的内容），剩余字节留在缓冲区等待后续读取。
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: Vec<u8>,
}

impl FrameAssembler {
    /// 创建空的重组器
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一段收到的字节
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// 取出下一个完整帧（不含行尾 `\n`）
    ///
    /// # 返回
    /// - `Some(Ok(line))` - 缓冲区中有完整的一行
    /// - `Some(Err(_))` - 该行不是合法 UTF-8，行已从缓冲区移除
    /// - `None` - 缓冲区中没有完整的一行
    pub fn next_frame(&mut self) -> Option<Result<String, ProtocolError>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=pos).collect();

        // 去掉行尾 `\n` 后解码
        match std::str::from_utf8(&line[..pos]) {
            Ok(s) => Some(Ok(s.to_string())),
            Err(e) => Some(Err(ProtocolError::from(e))),
        }
    }

    /// 缓冲区中尚未构成完整帧的字节数
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
