//! 码流语法解析器.

pub mod avs;
