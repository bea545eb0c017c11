//! 解析器配置.
//!
//! [`ParserConfig`] 在 `init` 时交给解析器, 运行期间可通过控制命令修改部分字段.
//! 调试开关按上下文保存, 由 [`ParserConfig::from_env`] 显式读取环境变量
//! `AVSD_PARSE_DEBUG`.

use std::time::Duration;

use avsd_core::{AvsdError, AvsdResult};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::frontends::avs::MAX_REF_PICTURES;

/// 调试开关环境变量
pub const DEBUG_ENV_VAR: &str = "AVSD_PARSE_DEBUG";

bitflags! {
    /// 解析器调试开关
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DebugFlags: u32 {
        /// 丢弃图像时输出图像与条带详情
        const ERROR    = 0x0000_0001;
        /// 每个任务提交后检查参考帧不变式
        const ASSERT   = 0x0000_0002;
        /// 参考帧隐藏时输出槽位表
        const WARNING  = 0x0000_0004;
        /// 常规流程日志
        const LOG      = 0x0000_0008;
        /// 输入数据包跟踪
        const INPUT    = 0x0000_0010;
        /// 耗时统计
        const TIME     = 0x0000_0020;
        /// 硬件回调跟踪
        const CALLBACK = 0x0000_8000;
    }
}

/// 参考帧缺失/损坏时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcealmentMode {
    /// 用最近的有效参考帧替代, 任务携带隐藏报告
    #[default]
    Substitute,
    /// 丢弃图像
    Drop,
}

/// 解析器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// 分割模式: 数据包为任意字节片段, 仅以起始码划分图像
    pub split_mode: bool,
    /// 参考帧隐藏策略
    pub concealment: ConcealmentMode,
    /// 帧缓冲槽位数
    pub slot_capacity: usize,
    /// 硬件连续错误容忍次数, 超过后上报致命错误
    pub max_hw_retries: u32,
    /// flush 等待硬件完成的最长时间 (毫秒)
    pub flush_timeout_ms: u64,
    /// 调试开关原始值, 见 [`DebugFlags`]
    pub debug: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            split_mode: false,
            concealment: ConcealmentMode::Substitute,
            slot_capacity: 8,
            max_hw_retries: 3,
            flush_timeout_ms: 200,
            debug: 0,
        }
    }
}

impl ParserConfig {
    /// 默认配置叠加环境变量 `AVSD_PARSE_DEBUG`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(debug) = std::env::var(DEBUG_ENV_VAR)
            .ok()
            .and_then(|v| parse_debug_value(&v))
        {
            config.debug = debug;
        }
        config
    }

    /// 调试开关 (未知位被忽略)
    pub fn debug_flags(&self) -> DebugFlags {
        DebugFlags::from_bits_truncate(self.debug)
    }

    /// flush 超时
    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    /// 校验配置
    pub fn validate(&self) -> AvsdResult<()> {
        if self.slot_capacity <= MAX_REF_PICTURES {
            return Err(AvsdError::InvalidArgument(format!(
                "slot_capacity={} 过小, 至少需要 {}",
                self.slot_capacity,
                MAX_REF_PICTURES + 1
            )));
        }
        if self.slot_capacity > u32::MAX as usize {
            return Err(AvsdError::InvalidArgument(format!(
                "slot_capacity={} 过大",
                self.slot_capacity
            )));
        }
        Ok(())
    }
}

/// 解析调试开关: 支持 `0x` 前缀十六进制或十进制
pub fn parse_debug_value(value: &str) -> Option<u32> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse::<u32>().ok(),
    }
}
