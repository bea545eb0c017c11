//! AVS 硬件解码前端.
//!
//! [`AvsParser`] 实现 [`Parser`] trait: 把基本流数据包解析为硬件解码任务,
//! 并维护解码顺序与参考帧状态. 像素解码由硬件完成.

mod context;
pub mod refs;
mod stream;
pub mod task_builder;

#[cfg(test)]
mod tests;

use avsd_core::{AvsdError, AvsdResult};
use log::{debug, info};

use crate::codec_id::CodecId;
use crate::config::ParserConfig;
use crate::control::{ControlCommand, ControlResponse, ParserStats};
use crate::packet::Packet;
use crate::parser::Parser;
use crate::parsers::avs::SequenceHeader;
use crate::task::{
    BufferHandle, CompletionNotifier, DecodeTask, FlushReport, HwCompletion, ParseOutcome,
};

use context::StreamContext;

pub use refs::{MAX_REF_PICTURES, RpmState};
pub use task_builder::AvsPictureParams;

/// AVS 解析器
///
/// 未初始化时除 `init`/`deinit` 外的操作返回 `NotInitialized`.
#[derive(Default)]
pub struct AvsParser {
    ctx: Option<StreamContext>,
}

impl AvsParser {
    /// 创建未初始化的解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 工厂函数 (供注册表使用)
    pub fn create() -> AvsdResult<Box<dyn Parser>> {
        Ok(Box::new(Self::new()))
    }

    /// 是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.ctx.is_some()
    }

    /// 参考帧管理器状态
    pub fn ref_state(&self) -> Option<RpmState> {
        self.ctx.as_ref().map(|c| c.ref_manager().state())
    }

    /// 当前参考帧句柄, 由旧到新
    pub fn reference_handles(&self) -> Vec<BufferHandle> {
        let Some(ctx) = self.ctx.as_ref() else {
            return Vec::new();
        };
        let rpm = ctx.ref_manager();
        rpm.references()
            .into_iter()
            .filter_map(|idx| rpm.slot(idx).map(|s| s.handle))
            .collect()
    }

    /// 当前序列头
    pub fn sequence_header(&self) -> Option<&SequenceHeader> {
        self.ctx.as_ref().and_then(|c| c.sequence_header())
    }

    /// 统计信息
    pub fn stats(&self) -> Option<&ParserStats> {
        self.ctx.as_ref().map(|c| c.stats())
    }

    /// 当前会话纪元
    pub fn epoch(&self) -> Option<u32> {
        self.ctx.as_ref().map(|c| c.epoch())
    }

    fn ctx_mut(&mut self) -> AvsdResult<&mut StreamContext> {
        self.ctx.as_mut().ok_or(AvsdError::NotInitialized)
    }
}

impl Parser for AvsParser {
    fn codec_id(&self) -> CodecId {
        CodecId::Avs
    }

    fn name(&self) -> &str {
        "avs"
    }

    fn init(&mut self, config: ParserConfig) -> AvsdResult<()> {
        if self.ctx.is_some() {
            return Err(AvsdError::AlreadyInitialized);
        }
        config.validate()?;
        info!(
            "AVS: 初始化解析器, split_mode={}, slot_capacity={}, concealment={:?}",
            config.split_mode, config.slot_capacity, config.concealment
        );
        self.ctx = Some(StreamContext::new(config));
        Ok(())
    }

    fn deinit(&mut self) {
        if self.ctx.take().is_some() {
            debug!("AVS: 解析器已销毁");
        }
    }

    fn reset(&mut self) -> AvsdResult<()> {
        self.ctx_mut()?.reset();
        Ok(())
    }

    fn flush(&mut self) -> AvsdResult<FlushReport> {
        Ok(self.ctx_mut()?.flush())
    }

    fn control(&mut self, cmd: ControlCommand) -> AvsdResult<ControlResponse> {
        self.ctx_mut()?.control(cmd)
    }

    fn prepare(&mut self, packet: Packet, task: &mut DecodeTask) -> AvsdResult<()> {
        self.ctx_mut()?.prepare(packet, task)
    }

    fn parse(&mut self, task: &mut DecodeTask) -> AvsdResult<ParseOutcome> {
        self.ctx_mut()?.parse(task)
    }

    fn callback(&mut self, completion: HwCompletion) -> AvsdResult<()> {
        self.ctx_mut()?.callback(completion)
    }

    fn completion_notifier(&self) -> Option<CompletionNotifier> {
        self.ctx.as_ref().map(|c| c.notifier())
    }
}
