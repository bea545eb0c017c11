//! 解析任务与硬件任务描述.
//!
//! - [`DecodeTask`]: `prepare` 绑定数据包, `parse` 消费数据包
//! - [`HwTask`]: 完成一幅图像后交给硬件的只读描述
//! - [`HwCompletion`]: 硬件完成通知, 经 `callback` 或 [`CompletionNotifier`] 送回
//! - [`ParseOutcome`] / [`FlushReport`]: 解析与刷新的结果

use std::fmt;
use std::sync::mpsc::Sender;

use avsd_core::{AvsdError, AvsdResult, Timestamp};
use bytes::Bytes;

use crate::frontends::avs::AvsPictureParams;
use crate::packet::Packet;

/// 任务标识: 会话纪元 + 解码序号
///
/// `reset` 会递增纪元, 旧纪元的完成通知会被忽略.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    /// 会话纪元
    pub epoch: u32,
    /// 解码序号 (reset 后从 0 开始)
    pub decode_order: u64,
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.epoch, self.decode_order)
    }
}

/// 帧缓冲句柄 (槽位索引)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferHandle(pub u32);

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf#{}", self.0)
    }
}

/// 解析任务
///
/// 由调用方持有, `prepare` 绑定数据包, `parse` 取走数据包.
#[derive(Debug, Default)]
pub struct DecodeTask {
    packet: Option<Packet>,
}

impl DecodeTask {
    /// 创建空任务
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否持有尚未解析的数据包
    pub fn is_bound(&self) -> bool {
        self.packet.is_some()
    }

    pub(crate) fn bind(&mut self, packet: Packet) {
        self.packet = Some(packet);
    }

    pub(crate) fn take_packet(&mut self) -> Option<Packet> {
        self.packet.take()
    }
}

/// 条带在任务码流中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSegment {
    /// 条带起始码在 [`HwTask::bitstream`] 中的字节偏移
    pub offset: usize,
    /// 条带字节长度 (含起始码)
    pub size: usize,
    /// 条带首宏块行
    pub vertical_position: u32,
    /// 条带 QP
    pub slice_qp: u8,
    /// 起始码之后条带头的位长
    pub header_bits: usize,
}

/// 参考方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefRole {
    /// 前向参考 (显示顺序在前)
    Forward,
    /// 后向参考 (显示顺序在后, 仅 B 图像)
    Backward,
}

/// 参考帧绑定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefBinding {
    /// 参考帧缓冲句柄
    pub handle: BufferHandle,
    /// 参考帧 POC
    pub poc: i32,
    /// 参考帧解码序号
    pub decode_order: u64,
    /// 参考方向
    pub role: RefRole,
}

/// 硬件所需的图像参数块
#[derive(Debug, Clone, PartialEq)]
pub enum PictureParams {
    /// AVS 图像参数
    Avs(AvsPictureParams),
}

/// 参考帧隐藏报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concealment {
    /// 触发隐藏的错误
    pub fault: AvsdError,
    /// 被替代的参考位置数
    pub substituted: usize,
}

/// 硬件解码任务
///
/// 返回后不再修改. 码流为冻结的 [`Bytes`], 可零拷贝交给硬件.
#[derive(Debug, Clone)]
pub struct HwTask {
    /// 任务标识
    pub id: TaskId,
    /// 显示时间戳 (来自图像起始码所在的数据包)
    pub pts: Timestamp,
    /// 解码时间戳
    pub dts: i64,
    /// 图像码流 (从图像起始码开始)
    pub bitstream: Bytes,
    /// 条带位置
    pub slices: Vec<SliceSegment>,
    /// 当前图像输出缓冲
    pub output: BufferHandle,
    /// 参考帧绑定
    pub refs: Vec<RefBinding>,
    /// 图像参数
    pub params: PictureParams,
    /// 隐藏报告 (参考帧有缺陷时)
    pub concealment: Option<Concealment>,
}

impl HwTask {
    /// AVS 图像参数
    pub fn avs_params(&self) -> &AvsPictureParams {
        match &self.params {
            PictureParams::Avs(params) => params,
        }
    }

    /// 参考帧句柄列表
    pub fn ref_handles(&self) -> Vec<BufferHandle> {
        self.refs.iter().map(|r| r.handle).collect()
    }
}

/// 硬件完成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwStatus {
    /// 解码成功
    Ok,
    /// 解码出错, 输出图像不可信
    Error,
}

/// 硬件完成通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwCompletion {
    /// 对应的任务
    pub task: TaskId,
    /// 完成状态
    pub status: HwStatus,
}

impl HwCompletion {
    /// 成功完成
    pub fn ok(task: TaskId) -> Self {
        Self {
            task,
            status: HwStatus::Ok,
        }
    }

    /// 出错完成
    pub fn error(task: TaskId) -> Self {
        Self {
            task,
            status: HwStatus::Error,
        }
    }
}

/// 跨线程完成通知器
///
/// 可克隆, 可在硬件中断线程中使用. 通知进入解析器的收件箱,
/// 在下一次 `prepare`/`parse`/`control`/`callback`/`flush` 时被处理.
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    sender: Sender<HwCompletion>,
}

impl CompletionNotifier {
    pub(crate) fn new(sender: Sender<HwCompletion>) -> Self {
        Self { sender }
    }

    /// 投递完成通知
    pub fn notify(&self, completion: HwCompletion) -> AvsdResult<()> {
        self.sender
            .send(completion)
            .map_err(|_| AvsdError::InvalidState("解析器已销毁, 无法投递完成通知".into()))
    }
}

/// 被丢弃的图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPicture {
    /// 解码序号 (图像头未能解析时为 None)
    pub decode_order: Option<u64>,
    /// 显示时间戳
    pub pts: Timestamp,
    /// 丢弃原因
    pub reason: AvsdError,
}

/// 一次 `parse` 的结果
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// 缓冲区中没有完整图像, 需要送入更多数据
    NeedMoreData,
    /// 完成一幅图像, 生成硬件任务
    Ready(HwTask),
    /// 完成一幅图像但被丢弃
    Dropped(DroppedPicture),
}

impl ParseOutcome {
    /// 取出硬件任务
    pub fn into_task(self) -> Option<HwTask> {
        match self {
            Self::Ready(task) => Some(task),
            _ => None,
        }
    }

    /// 是否需要更多数据
    pub fn is_need_more_data(&self) -> bool {
        matches!(self, Self::NeedMoreData)
    }
}

/// `flush` 结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// 尚未组装完成即被丢弃的图像 (解码序号)
    pub discarded: Vec<u64>,
    /// 等待期间收到的完成通知数
    pub completed: usize,
    /// 超时后强制丢弃的硬件任务
    pub force_discarded: Vec<TaskId>,
    /// 等待期间报告解码出错的硬件任务
    pub hw_errors: Vec<TaskId>,
    /// 等待期间连续错误超过上限时的致命错误
    pub fatal: Option<AvsdError>,
}

impl FlushReport {
    /// 所有硬件任务是否都已正常完成
    pub fn is_clean(&self) -> bool {
        self.force_discarded.is_empty() && self.hw_errors.is_empty() && self.fatal.is_none()
    }
}
