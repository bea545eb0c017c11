//! 编解码器标识符.
//!
//! 为解析器注册表中的每种码流格式分配唯一标识.

use std::fmt;

/// 编解码器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// 未知编解码器
    None,
    /// AVS (GB/T 20090.2) 视频
    Avs,
}

impl CodecId {
    /// 获取编解码器短名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Avs => "avs",
        }
    }

    /// 按短名称查找
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "avs" | "cavs" => Some(Self::Avs),
            _ => None,
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup() {
        assert_eq!(CodecId::Avs.to_string(), "avs");
        assert_eq!(CodecId::from_name("cavs"), Some(CodecId::Avs));
        assert_eq!(CodecId::from_name("h264"), None);
    }
}
