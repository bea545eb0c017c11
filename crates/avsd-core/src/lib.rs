//! # avsd-core
//!
//! AVS 硬件解码前端的核心库, 提供错误类型、比特流读写与基础数值类型.

pub mod bitreader;
pub mod bitwriter;
pub mod error;
pub mod rational;
pub mod timestamp;

// 重导出常用类型
pub use error::{AvsdError, AvsdResult, ErrorCategory};
pub use rational::Rational;
pub use timestamp::{NOPTS_VALUE, Timestamp};
