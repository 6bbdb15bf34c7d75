//! # CNC Client
//!
//! 机床控制的用户接口层，包括：
//! - 错误分类（[`CncError`]，每个错误带有机器可读错误码）
//! - G-code 指令构建（[`gcode`]）
//! - 安全门（[`safety`]：回零检查、E-stop 检查）
//! - 模式时序器（[`CncController`]）
//! - 服务层（[`CncService`]：默认值和参数校验）
//!
//! # 使用场景
//!
//! 大多数调用方应该使用 [`CncService`]；需要自定义校验或直接下发
//! [`MotionCommand`] 时可以使用 [`CncController`]。

pub mod controller;
pub mod error;
pub mod gcode;
pub mod safety;
pub mod service;
pub mod types;

// 重新导出常用类型
pub use controller::CncController;
pub use error::{CncError, ErrorReport};
pub use gcode::{DEFAULT_FEED_RATE, MotionCommand, PositioningMode, build_command};
pub use service::{CncService, MoveRequest};
pub use types::{MachineStatus, OperationOutcome, Position};
