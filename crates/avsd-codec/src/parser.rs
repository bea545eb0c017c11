//! 解析器 trait 定义.
//!
//! 所有硬件解码前端解析器必须实现 `Parser` trait.

use avsd_core::AvsdResult;

use crate::codec_id::CodecId;
use crate::config::ParserConfig;
use crate::control::{ControlCommand, ControlResponse};
use crate::packet::Packet;
use crate::task::{CompletionNotifier, DecodeTask, FlushReport, HwCompletion, ParseOutcome};

/// 硬件解码前端解析器 trait
///
/// 解析流程:
/// 1. `init()` 创建流上下文
/// 2. `prepare()` 把数据包绑定到任务
/// 3. 循环调用 `parse()` 直到返回 [`ParseOutcome::NeedMoreData`]
/// 4. 把 [`ParseOutcome::Ready`] 中的任务交给硬件
/// 5. 硬件完成后调用 `callback()` 或经 [`CompletionNotifier`] 投递
/// 6. 码流结束时 `flush()`, 之后 `reset()` 或 `deinit()`
///
/// 除 `flush` 外所有操作都不阻塞.
pub trait Parser: Send {
    /// 获取解析器对应的编解码器
    fn codec_id(&self) -> CodecId;

    /// 获取解析器名称
    fn name(&self) -> &str;

    /// 创建流上下文
    ///
    /// 已初始化时返回 `AlreadyInitialized`.
    fn init(&mut self, config: ParserConfig) -> AvsdResult<()>;

    /// 释放流上下文, 重复调用为空操作
    fn deinit(&mut self);

    /// 丢弃进行中的图像与参考状态, 保留序列参数
    fn reset(&mut self) -> AvsdResult<()>;

    /// 丢弃未完成的图像并等待硬件完成 (有超时), 之后进入排空状态
    fn flush(&mut self) -> AvsdResult<FlushReport>;

    /// 执行控制命令
    fn control(&mut self, cmd: ControlCommand) -> AvsdResult<ControlResponse>;

    /// 把数据包绑定到任务
    fn prepare(&mut self, packet: Packet, task: &mut DecodeTask) -> AvsdResult<()>;

    /// 推进解析, 每次最多完成一幅图像
    ///
    /// 码流数据错误以 [`ParseOutcome::Dropped`] 或隐藏报告体现, 不以 `Err` 返回.
    fn parse(&mut self, task: &mut DecodeTask) -> AvsdResult<ParseOutcome>;

    /// 处理硬件完成通知
    fn callback(&mut self, completion: HwCompletion) -> AvsdResult<()>;

    /// 获取跨线程完成通知器 (未初始化时为 None)
    fn completion_notifier(&self) -> Option<CompletionNotifier>;
}
