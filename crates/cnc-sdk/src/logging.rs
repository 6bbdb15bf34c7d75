//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 安装全局 fmt subscriber
///
/// `RUST_LOG` 存在时优先使用，否则使用 `default_level`（如 `"info"`、
/// `"cnc_client=debug"`）。日志写入 stderr。
///
/// 已经安装过全局 subscriber 时返回 `false`。
pub fn init_logging(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
