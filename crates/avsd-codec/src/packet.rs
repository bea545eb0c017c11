//! 压缩数据包 (Packet).
//!
//! 解复用器交给解析器的一段基本流数据. 在非分割模式下一个 Packet 包含
//! 若干完整图像; 在分割模式下可以是任意字节片段.
//! 码流结束的数据包带 `eos` 标志, 可以不含数据.

use avsd_core::{NOPTS_VALUE, Rational, Timestamp};
use bytes::Bytes;

/// 压缩数据包
#[derive(Debug, Clone)]
pub struct Packet {
    /// 基本流数据
    pub data: Bytes,
    /// 显示时间戳 (PTS)
    pub pts: i64,
    /// 解码时间戳 (DTS)
    pub dts: i64,
    /// 时间基
    pub time_base: Rational,
    /// 在容器中的字节偏移量 (-1 表示未知)
    pub pos: i64,
    /// 码流结束, 缓冲区中的末尾图像随本包完成
    pub eos: bool,
}

impl Packet {
    /// 创建空数据包
    pub fn empty() -> Self {
        Self {
            data: Bytes::new(),
            pts: NOPTS_VALUE,
            dts: NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            pos: -1,
            eos: false,
        }
    }

    /// 不含数据的码流结束包
    pub fn end_of_stream() -> Self {
        Self {
            eos: true,
            ..Self::empty()
        }
    }

    /// 从数据创建数据包
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::empty()
        }
    }

    /// 设置时间戳
    pub fn with_pts(mut self, pts: i64, time_base: Rational) -> Self {
        self.pts = pts;
        self.dts = pts;
        self.time_base = time_base;
        self
    }

    /// 标记为码流结束
    pub fn with_eos(mut self) -> Self {
        self.eos = true;
        self
    }

    /// 显示时间戳
    pub fn timestamp(&self) -> Timestamp {
        Timestamp::new(self.pts, self.time_base)
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空包
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
