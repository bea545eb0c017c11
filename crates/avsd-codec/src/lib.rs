//! # avsd-codec
//!
//! AVS 硬件解码前端: 码流语法解析、参考帧管理与硬件任务组装.
//!
//! 解析器不做像素解码. 它把基本流数据包转换为 [`HwTask`], 由硬件完成解码,
//! 再通过完成通知更新参考帧状态.
//!
//! ## 使用示例
//!
//! ```rust
//! use avsd_codec::{CodecId, ParserConfig, ParserRegistry};
//!
//! let mut reg = ParserRegistry::new();
//! avsd_codec::register_all(&mut reg);
//!
//! let mut parser = reg.create_parser(CodecId::Avs).unwrap();
//! parser.init(ParserConfig::default()).unwrap();
//! ```

pub mod codec_id;
pub mod config;
pub mod control;
pub mod frontends;
pub mod packet;
pub mod parser;
pub mod parsers;
pub mod registry;
pub mod task;

// 重导出常用类型
pub use codec_id::CodecId;
pub use config::{ConcealmentMode, DebugFlags, ParserConfig};
pub use control::{ControlCommand, ControlResponse, ParserStats};
pub use frontends::avs::{AvsParser, AvsPictureParams, MAX_REF_PICTURES, RpmState};
pub use packet::Packet;
pub use parser::Parser;
pub use registry::ParserRegistry;
pub use task::{
    BufferHandle, CompletionNotifier, Concealment, DecodeTask, DroppedPicture, FlushReport,
    HwCompletion, HwStatus, HwTask, ParseOutcome, PictureParams, RefBinding, RefRole,
    SliceSegment, TaskId,
};

/// 注册所有内置解析器
pub fn register_all(registry: &mut ParserRegistry) {
    frontends::register_all_parsers(registry);
}
