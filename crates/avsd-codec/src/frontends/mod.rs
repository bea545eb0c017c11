//! 硬件解码前端解析器实现.

pub mod avs;

use crate::codec_id::CodecId;
use crate::registry::ParserRegistry;

/// 注册所有内置解析器
pub fn register_all_parsers(registry: &mut ParserRegistry) {
    registry.register_parser(CodecId::Avs, "avs", avs::AvsParser::create);
}
