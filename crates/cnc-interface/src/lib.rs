//! # CNC Machine Interface Layer
//!
//! 实时运动控制器的抽象层，提供统一的机床访问接口。
//!
//! 本 crate 不实现任何运动控制，只定义上层需要的能力集合：
//! - 状态轮询（[`MachineInterface::poll_status`]）
//! - 异步错误队列（[`MachineInterface::pop_next_error`]）
//! - 状态/模式切换、MDI 指令、回零指令的下发
//! - 等待下发被控制器确认（[`MachineInterface::wait_complete`]）
//!
//! 启用 `mock` feature 后可使用 [`mock::MockMachine`]，无需真实控制器即可测试。

use thiserror::Error;

pub mod codes;

#[cfg(feature = "mock")]
pub mod mock;

pub use codes::{ErrorKind, InterpState, MachineMode, TaskState};

#[cfg(feature = "mock")]
pub use mock::{MockCall, MockMachine};

/// 机床接口层统一错误类型
#[derive(Error, Debug)]
pub enum InterfaceError {
    /// 与控制器的会话已断开
    #[error("Machine interface disconnected")]
    Disconnected,

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 控制器拒绝了下发的指令
    #[error("Command rejected: {0}")]
    Rejected(String),

    /// 等待控制器确认超时
    #[error("Acknowledge timeout")]
    Timeout,
}

/// 控制器原始状态
///
/// 控制器可能不报告某些字段（例如旧版本没有 `axis_mask`），
/// 这些字段用 `Option` 表示，由驱动层在轮询时补全默认值。
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawStatus {
    /// 各轴位置（轴数量由机床决定）
    pub position: Vec<f64>,
    /// 各关节回零标志（控制器内部通常是固定长度缓冲区）
    pub homed: Option<Vec<bool>>,
    /// 已配置轴的位掩码（X=1, Y=2, Z=4, ...）
    pub axis_mask: Option<u32>,
    /// 任务状态原始码，见 [`TaskState`]
    pub task_state: u8,
    /// 解释器状态原始码，见 [`InterpState`]
    pub interp_state: u8,
    /// 当前速度（机床单位/秒）
    pub current_velocity: f64,
}

/// 机床接口能力集合
///
/// 实现者持有与控制器的单一会话。所有方法都是阻塞调用。
///
/// # 调用约定
///
/// - `dispatch_*` 只负责下发；调用方负责随后调用 [`wait_complete`](Self::wait_complete)
/// - `pop_next_error` 每次取出一条，队列为空时返回 `Ok(None)`
pub trait MachineInterface: Send {
    /// 读取一次控制器状态
    fn poll_status(&mut self) -> Result<RawStatus, InterfaceError>;

    /// 取出异步错误队列中的下一条消息
    fn pop_next_error(&mut self) -> Result<Option<(ErrorKind, String)>, InterfaceError>;

    /// 下发任务状态切换（E-stop、复位、上电、断电）
    fn dispatch_state(&mut self, target: TaskState) -> Result<(), InterfaceError>;

    /// 下发机床模式切换
    fn dispatch_mode(&mut self, mode: MachineMode) -> Result<(), InterfaceError>;

    /// 下发单行 MDI 指令
    fn dispatch_mdi(&mut self, command: &str) -> Result<(), InterfaceError>;

    /// 下发单个关节的回零请求
    fn dispatch_home(&mut self, joint: usize) -> Result<(), InterfaceError>;

    /// 阻塞直到上一条下发被控制器确认
    fn wait_complete(&mut self) -> Result<(), InterfaceError>;
}

impl<T: MachineInterface + ?Sized> MachineInterface for Box<T> {
    fn poll_status(&mut self) -> Result<RawStatus, InterfaceError> {
        (**self).poll_status()
    }

    fn pop_next_error(&mut self) -> Result<Option<(ErrorKind, String)>, InterfaceError> {
        (**self).pop_next_error()
    }

    fn dispatch_state(&mut self, target: TaskState) -> Result<(), InterfaceError> {
        (**self).dispatch_state(target)
    }

    fn dispatch_mode(&mut self, mode: MachineMode) -> Result<(), InterfaceError> {
        (**self).dispatch_mode(mode)
    }

    fn dispatch_mdi(&mut self, command: &str) -> Result<(), InterfaceError> {
        (**self).dispatch_mdi(command)
    }

    fn dispatch_home(&mut self, joint: usize) -> Result<(), InterfaceError> {
        (**self).dispatch_home(joint)
    }

    fn wait_complete(&mut self) -> Result<(), InterfaceError> {
        (**self).wait_complete()
    }
}
