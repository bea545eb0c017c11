//! 日志初始化模块.
//!
//! 双输出:
//! - console: 彩色, debug 级别
//! - file: 无色, 按天滚动, 级别取自配置, 可通过 AVSD_LOG 环境变量覆盖
//!
//! 日志文件输出到 `{directory}/{prefix}.{date}.log`, 初始化时清理超过保留天数的旧文件.
//! 库 crate 通过 `log` 门面输出的记录经 tracing-log 桥接进入同一订阅器.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// 文件日志级别覆盖变量
pub const LOG_ENV_VAR: &str = "AVSD_LOG";

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 文件日志级别 (EnvFilter 语法)
    #[serde(default = "default_level")]
    pub level: String,
    /// 日志目录
    #[serde(default = "default_directory")]
    pub directory: String,
    /// 文件名前缀
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// 保留天数
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_directory() -> String {
    "logs".to_string()
}

fn default_file_prefix() -> String {
    "avsd".to_string()
}

fn default_retention_days() -> i64 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: default_directory(),
            file_prefix: default_file_prefix(),
            retention_days: default_retention_days(),
        }
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 初始化日志系统
///
/// 全局订阅器只能安装一次, 重复调用返回错误.
pub fn init(config: LoggingConfig) -> Result<()> {
    let directory = Path::new(&config.directory);
    fs::create_dir_all(directory)
        .with_context(|| format!("创建日志目录失败, path={}", directory.display()))?;

    match cleanup_logs(&config) {
        Ok(removed) if removed > 0 => eprintln!("已清理 {} 个过期日志文件", removed),
        Ok(_) => {}
        Err(err) => eprintln!("清理过期日志失败: {:#}", err),
    }

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .build(directory)
        .with_context(|| format!("创建日志文件失败, path={}", directory.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Console: debug 级别, 彩色
    let console_filter = EnvFilter::new("debug");
    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(ConsoleFormatter)
        .with_filter(console_filter);

    let file_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(&config.level));
    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("安装全局日志订阅器失败")?;
    LOG_GUARD.set(guard).ok();
    Ok(())
}

/// 当前日志文件路径
///
/// 文件名中的日期由 tracing-appender 按 UTC 计算.
pub fn current_log_path(config: &LoggingConfig) -> PathBuf {
    build_log_path(
        Path::new(&config.directory),
        &config.file_prefix,
        Utc::now().date_naive(),
    )
}

pub(crate) fn build_log_path(directory: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    directory.join(format!("{}.{}.log", prefix, date.format("%Y-%m-%d")))
}

/// 删除超过保留天数的日志文件, 返回删除数量
///
/// 只处理 `{prefix}.{YYYY-MM-DD}.log` 形式的文件.
pub fn cleanup_logs(config: &LoggingConfig) -> Result<usize> {
    let directory = Path::new(&config.directory);
    if !directory.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now().date_naive() - ChronoDuration::days(config.retention_days);
    let mut removed = 0;
    let entries = fs::read_dir(directory)
        .with_context(|| format!("读取日志目录失败, path={}", directory.display()))?;
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(date) = parse_log_file_name(&file_name, &config.file_prefix) else {
            continue;
        };
        if date < cutoff {
            let path = entry.path();
            fs::remove_file(&path)
                .with_context(|| format!("删除过期日志失败, path={}", path.display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn parse_log_file_name(file_name: &str, prefix: &str) -> Option<NaiveDate> {
    let date_part = file_name
        .strip_prefix(prefix)?
        .strip_prefix('.')?
        .strip_suffix(".log")?;
    if date_part.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Console 格式: 彩色, 带时间戳和源码位置
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        let meta = event.metadata();
        write!(
            writer,
            "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis()
        )?;
        let color = match *meta.level() {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        };
        write!(
            writer,
            "{}{:5}\x1b[0m {}:{} > ",
            color,
            meta.level().to_string(),
            meta.file().unwrap_or("unknown"),
            meta.line().unwrap_or(0)
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// File 格式: 无色, 无源码位置
struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        write!(
            writer,
            "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] {:5} > ",
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis(),
            event.metadata().level().to_string()
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_log_path() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 6);
        match date {
            Some(date) => {
                let path = build_log_path(Path::new("logs"), "worker", date);
                assert_eq!(path, PathBuf::from("logs/worker.2026-02-06.log"));
            }
            None => panic!("测试日期初始化失败"),
        }
    }

    #[test]
    fn test_parse_log_file_name() {
        assert_eq!(
            parse_log_file_name("worker.2026-02-06.log", "worker"),
            NaiveDate::from_ymd_opt(2026, 2, 6)
        );
        assert!(parse_log_file_name("worker.log", "worker").is_none());
        assert!(parse_log_file_name("other.2026-02-06.log", "worker").is_none());
        assert!(parse_log_file_name("worker.2026-2-6.log", "worker").is_none());
        assert!(parse_log_file_name("worker.2026-02-06.log.gz", "worker").is_none());
    }
}
