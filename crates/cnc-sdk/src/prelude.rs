//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use cnc_sdk::prelude::*;
//! ```

// 客户端层（推荐使用）
pub use crate::client::{
    CncController, CncService, MachineStatus, MotionCommand, MoveRequest, OperationOutcome,
    Position, PositioningMode,
};

// 会话
pub use crate::session::{Session, SessionHandle};

// 接口层（常用 Trait 和状态码）
pub use crate::interface::{InterpState, MachineInterface, MachineMode, TaskState};

// 配置
pub use crate::tools::Settings;

// 错误类型
pub use crate::client::CncError;
pub use crate::driver::DriverError;
pub use crate::interface::InterfaceError;
pub use crate::session::SessionError;
