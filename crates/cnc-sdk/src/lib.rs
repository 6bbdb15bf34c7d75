//! CNC SDK - 实时运动控制器之上的机床控制 SDK
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **接口层** (`interface`): 机床接口能力集合、状态码、模拟机床
//! - **驱动层** (`driver`): 状态轮询（带重试）、快照缓存、完成等待
//! - **客户端层** (`client`): 安全门、模式时序器、G-code 构建、服务层
//! - **工具层** (`tools`): 配置文件和安全限制
//!
//! # 快速开始
//!
//! ```rust,ignore
//! use cnc_sdk::prelude::*;
//!
//! let settings = Settings::load_or_default("cnc.toml")?;
//! let service = CncService::connect(machine, &settings);
//! let session = Session::spawn(service)?;
//! let handle = session.handle();
//! handle.home(true)?;
//! ```
//!
//! 所有机床操作都是阻塞的。同一台机床的请求应通过 [`Session`] 串行化，
//! 不要在异步执行器线程上直接调用。

pub use cnc_client as client;
pub use cnc_driver as driver;
pub use cnc_interface as interface;
pub use cnc_tools as tools;

pub mod logging;
pub mod prelude;
pub mod session;

// --- 用户以此为界 ---

pub use logging::init_logging;
pub use session::{Session, SessionError, SessionHandle};

// 客户端层（推荐入口）
pub use cnc_client::{
    CncController, CncError, CncService, ErrorReport, MachineStatus, MotionCommand, MoveRequest,
    OperationOutcome, Position, PositioningMode,
};

// 驱动层（高级用户使用）
pub use cnc_driver::{DriverConfig, DriverError, MachineDriver, MachineSnapshot};

// 接口层
pub use cnc_interface::{InterfaceError, MachineInterface};

#[cfg(feature = "mock")]
pub use cnc_interface::MockMachine;

// 配置
pub use cnc_tools::{Settings, SettingsError};
