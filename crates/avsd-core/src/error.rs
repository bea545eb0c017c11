//! 统一错误类型定义.
//!
//! 所有 avsd crate 共用的错误类型. 错误分为四类 (见 [`ErrorCategory`]),
//! 调用方据此区分 "码流数据有问题" 与 "调用方式有问题".

use thiserror::Error;

/// avsd 统一错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AvsdError {
    /// 剩余位数不足以完成读取
    #[error("码流数据不足")]
    BitstreamExhausted,

    /// 变长码字超出支持范围
    #[error("无效码字: {0}")]
    InvalidCode(String),

    /// 语法字段超出合法范围
    #[error("语法违规: {0}")]
    SyntaxViolation(String),

    /// 语法合法但尚未实现的档次/扩展
    #[error("不支持的特性: {0}")]
    UnsupportedFeature(String),

    /// 参考帧缺失 (码流损坏或从非关键帧开始)
    #[error("参考帧缺失: 需要 {needed} 个, 可用 {available} 个")]
    MissingReference {
        /// 需要的参考帧数
        needed: usize,
        /// 实际可用的参考帧数
        available: usize,
    },

    /// 参考帧已被硬件标记为损坏
    #[error("参考帧损坏: 解码序号 {0}")]
    CorruptReference(u64),

    /// 条带未覆盖完整图像
    #[error("条带覆盖不完整: {0}")]
    IncompleteSlices(String),

    /// 帧缓冲槽位耗尽, 需要调用方先释放输出帧
    #[error("帧缓冲槽位耗尽")]
    BufferPoolExhausted,

    /// 输入数据包无效
    #[error("无效数据包: {0}")]
    InvalidPacket(String),

    /// 未知控制命令
    #[error("不支持的控制命令: {0}")]
    UnsupportedCommand(String),

    /// 重复初始化
    #[error("解析器已初始化")]
    AlreadyInitialized,

    /// 未初始化即调用
    #[error("解析器未初始化")]
    NotInitialized,

    /// 当前状态不允许该操作
    #[error("状态错误: {0}")]
    InvalidState(String),

    /// 无效参数 (配置等)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 硬件连续报错超过重试上限
    #[error("硬件连续错误 {consecutive_errors} 次, 码流不可恢复")]
    HardwareFatal {
        /// 连续错误次数
        consecutive_errors: u32,
    },
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 码流数据错误, 可通过跳帧/隐藏恢复
    StreamData,
    /// 资源背压, 调用方释放资源后重试
    Backpressure,
    /// 调用顺序或参数错误, 对本次调用致命但不影响码流
    Usage,
    /// 流级致命错误
    Fatal,
}

impl AvsdError {
    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BitstreamExhausted
            | Self::InvalidCode(_)
            | Self::SyntaxViolation(_)
            | Self::UnsupportedFeature(_)
            | Self::MissingReference { .. }
            | Self::CorruptReference(_)
            | Self::IncompleteSlices(_) => ErrorCategory::StreamData,
            Self::BufferPoolExhausted => ErrorCategory::Backpressure,
            Self::InvalidPacket(_)
            | Self::UnsupportedCommand(_)
            | Self::AlreadyInitialized
            | Self::NotInitialized
            | Self::InvalidState(_)
            | Self::InvalidArgument(_) => ErrorCategory::Usage,
            Self::HardwareFatal { .. } => ErrorCategory::Fatal,
        }
    }

    /// 是否可在码流内部恢复 (跳到下一图像边界或隐藏)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::StreamData | ErrorCategory::Backpressure
        )
    }
}

/// avsd 统一 Result 类型
pub type AvsdResult<T> = Result<T, AvsdError>;
