//! # avsd
//!
//! AVS (GB/T 20090.2) 硬件解码前端.
//!
//! 把 AVS 基准档次基本流数据包解析为硬件解码任务:
//! - **码流解析**: 起始码扫描, 序列头/图像头/条带头语法解析
//! - **图像组装**: 按起始码划分图像, 支持任意分片的数据包
//! - **参考帧管理**: 固定槽位帧缓冲, 最多两个参考帧, 缺失参考时隐藏替代
//! - **硬件交互**: 生成 [`codec::HwTask`], 接收完成通知
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use avsd::codec::{CodecId, DecodeTask, Packet, ParseOutcome, ParserConfig};
//!
//! let registry = avsd::default_parser_registry();
//! let mut parser = registry.create_parser(CodecId::Avs).unwrap();
//! parser.init(ParserConfig::default()).unwrap();
//!
//! let mut task = DecodeTask::new();
//! parser.prepare(Packet::from_data(vec![0u8, 0, 1, 0xB0]), &mut task).unwrap();
//! while let ParseOutcome::Ready(hw) = parser.parse(&mut task).unwrap() {
//!     println!("任务 {} -> {}", hw.id, hw.output);
//! }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `avsd-core` | 错误类型, 比特流读写, 时间戳 |
//! | `avsd-codec` | 语法解析, 解析器与硬件任务 |

pub mod logging;

/// 核心类型与工具
pub use avsd_core as core;

/// 码流解析与硬件任务
pub use avsd_codec as codec;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解析器的注册表
pub fn default_parser_registry() -> avsd_codec::ParserRegistry {
    let mut registry = avsd_codec::ParserRegistry::new();
    avsd_codec::register_all(&mut registry);
    registry
}
