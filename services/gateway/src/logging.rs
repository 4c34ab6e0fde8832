//! 日志系统模块职责：
//! 1. 初始化 stdout + 文件双通道 tracing 日志。
//! 2. 文件日志按天滚动，只保留最近若干个文件。

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// 默认日志目录（相对当前工作目录）。
const DEFAULT_LOG_DIR: &str = "logs";
/// 日志目录环境变量。
const LOG_DIR_ENV: &str = "TOKENGATE_LOG_DIR";
/// 文件日志级别环境变量（独立于 `RUST_LOG`）。
const FILE_LOG_LEVEL_ENV: &str = "TOKENGATE_FILE_LOG_LEVEL";
/// 保留日志文件数量环境变量。
const LOG_MAX_FILES_ENV: &str = "TOKENGATE_LOG_MAX_FILES";
/// 默认保留的滚动日志文件数。
const DEFAULT_MAX_LOG_FILES: usize = 5;
/// stdout 默认日志过滤。
const DEFAULT_STDOUT_FILTER: &str = "info";

/// 日志运行时守卫，防止 non-blocking writer 提前析构。
pub(crate) struct LogRuntime {
    _stdout_guard: WorkerGuard,
    _file_guard: WorkerGuard,
}

/// 初始化 gateway 日志系统。
pub(crate) fn init(service_name: &str) -> Result<LogRuntime> {
    let log_dir = resolve_log_dir(std::env::var(LOG_DIR_ENV).ok());
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log dir: {}", log_dir.display()))?;

    let max_files = parse_max_log_files(std::env::var(LOG_MAX_FILES_ENV).ok().as_deref());
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(service_name)
        .filename_suffix("log")
        .max_log_files(max_files)
        .build(&log_dir)
        .with_context(|| format!("create log appender under {}", log_dir.display()))?;
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(stdout_writer)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(resolve_stdout_env_filter());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(parse_file_level(
            std::env::var(FILE_LOG_LEVEL_ENV).ok().as_deref(),
        ));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(LogRuntime {
        _stdout_guard: stdout_guard,
        _file_guard: file_guard,
    })
}

/// stdout 过滤规则：优先 `RUST_LOG`，回退默认级别。
fn resolve_stdout_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDOUT_FILTER))
}

/// 文件日志级别；默认 `debug`，便于审计回放。
fn parse_file_level(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::DEBUG)
}

/// 保留文件数；非法或为 0 时使用默认值。
fn parse_max_log_files(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_LOG_FILES)
}

/// 相对路径按当前工作目录解析为绝对路径。
fn resolve_log_dir(raw: Option<String>) -> PathBuf {
    let path = PathBuf::from(raw.unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()));
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(dir) => dir.join(path),
        Err(_) => PathBuf::from(DEFAULT_LOG_DIR),
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::{DEFAULT_MAX_LOG_FILES, parse_file_level, parse_max_log_files, resolve_log_dir};

    #[test]
    fn max_log_files_falls_back_to_default() {
        assert_eq!(parse_max_log_files(None), DEFAULT_MAX_LOG_FILES);
        assert_eq!(parse_max_log_files(Some("0")), DEFAULT_MAX_LOG_FILES);
        assert_eq!(parse_max_log_files(Some("many")), DEFAULT_MAX_LOG_FILES);
        assert_eq!(parse_max_log_files(Some(" 12 ")), 12);
    }

    #[test]
    fn file_level_defaults_to_debug() {
        assert_eq!(parse_file_level(None), LevelFilter::DEBUG);
        assert_eq!(parse_file_level(Some("warn")), LevelFilter::WARN);
        assert_eq!(parse_file_level(Some("loud")), LevelFilter::DEBUG);
    }

    #[test]
    fn log_dir_is_absolute() {
        assert!(resolve_log_dir(None).is_absolute());
        assert!(resolve_log_dir(Some("rel/logs".to_string())).ends_with("rel/logs"));
        assert_eq!(
            resolve_log_dir(Some("/var/log/tokengate".to_string())),
            std::path::PathBuf::from("/var/log/tokengate")
        );
    }
}
