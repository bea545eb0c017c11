//! 解析器控制命令.
//!
//! 运行期间修改配置、查询状态、释放输出帧. 数值命令码通过
//! [`ControlCommand::from_raw`] 映射.

use std::time::Duration;

use avsd_core::{AvsdError, AvsdResult};
use serde::Serialize;

use crate::config::ConcealmentMode;
use crate::parsers::avs::SequenceHeader;
use crate::task::BufferHandle;

/// 命令码: 设置隐藏策略 (param: 0=替代, 其他=丢弃)
pub const CMD_SET_CONCEALMENT: u32 = 0x01;
/// 命令码: 设置分割模式 (param: 0=关闭, 其他=开启)
pub const CMD_SET_SPLIT_MODE: u32 = 0x02;
/// 命令码: 设置 flush 超时 (param: 毫秒)
pub const CMD_SET_FLUSH_TIMEOUT: u32 = 0x03;
/// 命令码: 设置硬件连续错误容忍次数
pub const CMD_SET_MAX_HW_RETRIES: u32 = 0x04;
/// 命令码: 查询当前序列头
pub const CMD_GET_SEQUENCE_HEADER: u32 = 0x10;
/// 命令码: 查询统计信息
pub const CMD_GET_STATS: u32 = 0x11;
/// 命令码: 释放输出帧 (param: 缓冲句柄)
pub const CMD_RELEASE_OUTPUT: u32 = 0x20;

/// 控制命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// 设置参考帧隐藏策略
    SetConcealment(ConcealmentMode),
    /// 开关分割模式
    SetSplitMode(bool),
    /// 设置 flush 超时
    SetFlushTimeout(Duration),
    /// 设置硬件连续错误容忍次数
    SetMaxHwRetries(u32),
    /// 查询当前序列头
    GetSequenceHeader,
    /// 查询统计信息
    GetStats,
    /// 调用方已显示/拷贝完输出帧, 释放其缓冲
    ReleaseOutput(BufferHandle),
    /// 未知命令码
    Other(u32),
}

impl ControlCommand {
    /// 从数值命令码构造
    ///
    /// 未知命令码映射为 [`ControlCommand::Other`]; 已知命令的参数越界返回
    /// `InvalidArgument`.
    pub fn from_raw(code: u32, param: u64) -> AvsdResult<Self> {
        let cmd = match code {
            CMD_SET_CONCEALMENT => Self::SetConcealment(if param == 0 {
                ConcealmentMode::Substitute
            } else {
                ConcealmentMode::Drop
            }),
            CMD_SET_SPLIT_MODE => Self::SetSplitMode(param != 0),
            CMD_SET_FLUSH_TIMEOUT => Self::SetFlushTimeout(Duration::from_millis(param)),
            CMD_SET_MAX_HW_RETRIES => {
                Self::SetMaxHwRetries(u32::try_from(param).unwrap_or(u32::MAX))
            }
            CMD_GET_SEQUENCE_HEADER => Self::GetSequenceHeader,
            CMD_GET_STATS => Self::GetStats,
            CMD_RELEASE_OUTPUT => {
                let handle = u32::try_from(param).map_err(|_| {
                    AvsdError::InvalidArgument(format!("输出缓冲句柄越界: {}", param))
                })?;
                Self::ReleaseOutput(BufferHandle(handle))
            }
            other => Self::Other(other),
        };
        Ok(cmd)
    }
}

/// 控制命令应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlResponse {
    /// 命令已执行
    Ack,
    /// 当前序列头 (尚未收到时为 None)
    SequenceHeader(Option<Box<SequenceHeader>>),
    /// 统计信息
    Stats(ParserStats),
}

/// 解析统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParserStats {
    /// 接收的数据包数
    pub packets: u64,
    /// 解析成功的序列头数
    pub sequence_headers: u64,
    /// 解析成功的图像头数
    pub pictures: u64,
    /// 生成的硬件任务数
    pub tasks: u64,
    /// 丢弃的图像数
    pub dropped: u64,
    /// 使用隐藏的任务数
    pub concealed: u64,
    /// 语法错误数
    pub syntax_errors: u64,
    /// 硬件成功完成数
    pub hw_completed: u64,
    /// 硬件出错数
    pub hw_errors: u64,
    /// 因槽位耗尽而暂停的次数
    pub pool_stalls: u64,
}
