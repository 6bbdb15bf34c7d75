//! 控制器状态码定义
//!
//! 数值与实时控制器对外暴露的常量保持一致，便于直接与原始状态互转。

use std::fmt;

use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};

/// 任务状态（上电/安全状态）
///
/// 同时用作状态切换指令的目标值。`EstopReset` 是 E-stop 复位后、
/// 上电前的中间状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TaskState {
    Estop = 1,
    EstopReset = 2,
    Off = 3,
    On = 4,
}

impl TaskState {
    pub fn as_u8(self) -> u8 {
        self.into()
    }

    pub fn is_estop(self) -> bool {
        self == Self::Estop
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Estop => "ESTOP",
            Self::EstopReset => "ESTOP_RESET",
            Self::Off => "OFF",
            Self::On => "ON",
        };
        f.write_str(name)
    }
}

/// 解释器状态
///
/// 未知的状态码原样保留在 `Other` 中，不做归并。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum InterpState {
    Idle = 1,
    Reading = 2,
    Paused = 3,
    Waiting = 4,
    #[num_enum(catch_all)]
    Other(u8),
}

impl InterpState {
    /// 原始状态码
    pub fn code(self) -> u8 {
        match self {
            Self::Idle => 1,
            Self::Reading => 2,
            Self::Paused => 3,
            Self::Waiting => 4,
            Self::Other(code) => code,
        }
    }

    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

/// 机床模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MachineMode {
    /// 手动模式（回零、点动）
    Manual = 1,
    /// 自动模式（程序运行）
    Auto = 2,
    /// 手动数据输入模式（单行指令）
    Mdi = 3,
}

impl fmt::Display for MachineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Manual => "MANUAL",
            Self::Auto => "AUTO",
            Self::Mdi => "MDI",
        };
        f.write_str(name)
    }
}

/// 错误队列消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ErrorKind {
    NmlError = 11,
    NmlText = 12,
    NmlDisplay = 13,
    OperatorError = 14,
    OperatorText = 15,
    OperatorDisplay = 16,
    #[num_enum(catch_all)]
    Other(u8),
}

impl ErrorKind {
    /// 原始类型码
    pub fn code(self) -> u8 {
        match self {
            Self::NmlError => 11,
            Self::NmlText => 12,
            Self::NmlDisplay => 13,
            Self::OperatorError => 14,
            Self::OperatorText => 15,
            Self::OperatorDisplay => 16,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
