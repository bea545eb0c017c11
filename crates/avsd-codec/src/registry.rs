//! 解析器注册表.
//!
//! 按 [`CodecId`] 查找并实例化解析器, 其他码流格式以新的注册条目接入.

use std::collections::HashMap;

use avsd_core::{AvsdError, AvsdResult};

use crate::codec_id::CodecId;
use crate::parser::Parser;

/// 解析器工厂函数类型
pub type ParserFactory = fn() -> AvsdResult<Box<dyn Parser>>;

/// 解析器注册表
pub struct ParserRegistry {
    /// 解析器工厂映射
    parsers: HashMap<CodecId, Vec<ParserEntry>>,
}

/// 解析器注册条目
struct ParserEntry {
    /// 解析器名称
    name: String,
    /// 工厂函数
    factory: ParserFactory,
}

impl ParserRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// 注册一个解析器
    pub fn register_parser(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        factory: ParserFactory,
    ) {
        self.parsers.entry(codec_id).or_default().push(ParserEntry {
            name: name.into(),
            factory,
        });
    }

    /// 创建指定编解码器 ID 的解析器实例
    pub fn create_parser(&self, codec_id: CodecId) -> AvsdResult<Box<dyn Parser>> {
        // 使用第一个注册的解析器 (优先级最高)
        let entry = self
            .parsers
            .get(&codec_id)
            .and_then(|entries| entries.first())
            .ok_or_else(|| AvsdError::InvalidArgument(format!("未找到 {} 的解析器", codec_id)))?;
        (entry.factory)()
    }

    /// 按名称创建解析器实例
    pub fn create_parser_by_name(&self, name: &str) -> AvsdResult<Box<dyn Parser>> {
        let entry = self
            .parsers
            .values()
            .flatten()
            .find(|e| e.name == name)
            .ok_or_else(|| AvsdError::InvalidArgument(format!("未找到解析器 {}", name)))?;
        (entry.factory)()
    }

    /// 获取所有已注册的解析器名称
    pub fn list_parsers(&self) -> Vec<(CodecId, &str)> {
        let mut result = Vec::new();
        for (id, entries) in &self.parsers {
            for entry in entries {
                result.push((*id, entry.name.as_str()));
            }
        }
        result
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
