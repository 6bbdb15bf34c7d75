//! 错误类型定义
//!
//! 每个错误都带有机器可读的错误码，传输层可以直接转换为 [`ErrorReport`]。

use std::collections::BTreeMap;

use cnc_driver::DriverError;
use cnc_interface::ErrorKind;
use cnc_tools::LimitViolation;
use thiserror::Error;

/// 客户端层错误
#[derive(Debug, Error)]
pub enum CncError {
    /// 轮询重试耗尽或接口会话失败，整个会话应视为不可信
    #[error("Machine connection failed: {0}")]
    Connection(#[source] DriverError),

    #[error("All axes must be homed before motion commands")]
    NotHomed,

    #[error("Cannot turn machine on while E-stop is active")]
    EStopActive,

    /// 控制器拒绝或执行出错的 G-code
    #[error("G-code error [{kind}]: {text} (G-code: {command})")]
    Motion {
        kind: ErrorKind,
        text: String,
        command: String,
    },

    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter { param: String, reason: String },

    /// 只在配置了等待期限时出现
    #[error("Wait timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl CncError {
    /// 机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            CncError::Connection(_) => "CONNECTION_ERROR",
            CncError::NotHomed => "MACHINE_NOT_HOMED",
            CncError::EStopActive => "ESTOP_ACTIVE",
            CncError::Motion { .. } => "MOTION_ERROR",
            CncError::InvalidParameter { .. } => "INVALID_PARAMETER",
            CncError::Timeout { .. } => "WAIT_TIMEOUT",
        }
    }

    /// 调用方修正后可以重试（连接失败和等待超时不可恢复）
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CncError::Connection(_) | CncError::Timeout { .. })
    }

    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        CncError::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

impl From<DriverError> for CncError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Timeout { timeout_ms } => CncError::Timeout { timeout_ms },
            other => CncError::Connection(other),
        }
    }
}

impl From<LimitViolation> for CncError {
    fn from(violation: LimitViolation) -> Self {
        CncError::InvalidParameter {
            param: violation.param,
            reason: violation.reason,
        }
    }
}

/// 传输层错误报告
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorReport {
    /// 总是 `true`
    pub error: bool,
    pub error_code: String,
    pub message: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub details: Option<BTreeMap<String, String>>,
}

impl From<&CncError> for ErrorReport {
    fn from(err: &CncError) -> Self {
        let details = match err {
            CncError::Motion { kind, text, command } => Some(BTreeMap::from([
                ("kind".to_string(), kind.to_string()),
                ("text".to_string(), text.clone()),
                ("gcode".to_string(), command.clone()),
            ])),
            CncError::InvalidParameter { param, reason } => Some(BTreeMap::from([
                ("parameter".to_string(), param.clone()),
                ("reason".to_string(), reason.clone()),
            ])),
            CncError::Timeout { timeout_ms } => Some(BTreeMap::from([(
                "timeout_ms".to_string(),
                timeout_ms.to_string(),
            )])),
            CncError::Connection(_) | CncError::NotHomed | CncError::EStopActive => None,
        };

        Self {
            error: true,
            error_code: err.code().to_string(),
            message: err.to_string(),
            details,
        }
    }
}
