//! 码流缓冲.
//!
//! 累积数据包字节, 并记录每个数据包在缓冲区中的起始位置与时间戳,
//! 以便把图像起始码所在数据包的时间戳带到硬件任务上.

use std::collections::VecDeque;

use avsd_core::{NOPTS_VALUE, Rational, Timestamp};
use bytes::{Bytes, BytesMut};

use crate::packet::Packet;

/// 数据包在缓冲区中的标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PacketMark {
    /// 数据包首字节在缓冲区中的偏移
    start: usize,
    pts: i64,
    dts: i64,
    time_base: Rational,
}

/// 码流缓冲
#[derive(Debug, Default)]
pub(super) struct StreamBuffer {
    data: BytesMut,
    marks: VecDeque<PacketMark>,
}

impl StreamBuffer {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// 追加数据包
    pub(super) fn push(&mut self, packet: &Packet) {
        self.marks.push_back(PacketMark {
            start: self.data.len(),
            pts: packet.pts,
            dts: packet.dts,
            time_base: packet.time_base,
        });
        self.data.extend_from_slice(&packet.data);
    }

    pub(super) fn len(&self) -> usize {
        self.data.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(super) fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// `offset` 处字节所属数据包的时间戳 (pts, dts)
    pub(super) fn timestamps_at(&self, offset: usize) -> (Timestamp, i64) {
        self.marks
            .iter()
            .rev()
            .find(|m| m.start <= offset)
            .map(|m| (Timestamp::new(m.pts, m.time_base), m.dts))
            .unwrap_or((Timestamp::none(), NOPTS_VALUE))
    }

    /// 取出前 `n` 个字节 (零拷贝冻结)
    pub(super) fn take(&mut self, n: usize) -> Bytes {
        let n = n.min(self.data.len());
        let taken = self.data.split_to(n).freeze();
        self.shift_marks(n);
        taken
    }

    /// 丢弃前 `n` 个字节
    pub(super) fn discard(&mut self, n: usize) {
        let _ = self.take(n);
    }

    /// 清空缓冲
    pub(super) fn clear(&mut self) {
        self.data.clear();
        self.marks.clear();
    }

    /// 前移标记: 覆盖新起点的标记保留并归零, 更早的标记丢弃
    fn shift_marks(&mut self, n: usize) {
        while self.marks.len() > 1 && self.marks[1].start <= n {
            self.marks.pop_front();
        }
        for mark in &mut self.marks {
            mark.start = mark.start.saturating_sub(n);
        }
        if self.data.is_empty() {
            self.marks.clear();
        }
    }
}
