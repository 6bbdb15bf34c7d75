//! 驱动层错误类型定义

use cnc_interface::InterfaceError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 状态轮询在重试耗尽后仍然失败
    #[error("Status poll failed after {attempts} attempts: {source}")]
    PollFailed {
        attempts: u32,
        #[source]
        source: Box<DriverError>,
    },

    /// 机床接口错误
    #[error("Machine interface error: {0}")]
    Interface(#[from] InterfaceError),

    /// 控制器返回了无法识别的状态
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// 等待超时（仅在配置了等待期限时出现）
    #[error("Wait timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}
