//! 驱动层模块
//!
//! 本模块负责与机床接口会话的所有底层交互，包括：
//! - 状态轮询（带有界重试）
//! - 状态快照缓存（ArcSwap 无锁读取）
//! - 异步错误队列的清空
//! - 阻塞式下发（下发 + 等待控制器确认）
//! - 完成等待（按固定间隔重新轮询，直到条件成立）
//!
//! # 使用场景
//!
//! 大多数用户应该使用 `cnc-client` 提供的 `CncController`，
//! 它在本模块之上实现了安全检查和模式切换的顺序。

mod cache;
mod driver;
mod error;
mod queue;
pub mod retry;
pub mod snapshot;

pub use cache::StatusCache;
pub use driver::{DriverConfig, MachineDriver};
pub use error::DriverError;
pub use queue::PendingError;
pub use retry::RetryPolicy;
pub use snapshot::{DEFAULT_JOINT_COUNT, MachineSnapshot, joint_count_from_mask};

pub use cnc_interface::{ErrorKind, InterpState, MachineInterface, MachineMode, RawStatus, TaskState};
