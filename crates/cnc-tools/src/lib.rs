//! # CNC Tools - 共享配置和安全限制
//!
//! **依赖原则**: 不依赖 `cnc-driver` / `cnc-client`，只提供纯数据结构和检查函数
//!
//! ## 包含模块
//!
//! - `settings` - 应用配置（TOML 文件 + 环境变量覆盖）
//! - `safety` - 参数安全限制（进给速度、坐标范围）

pub mod safety;
pub mod settings;

// 重新导出常用类型
pub use safety::{LimitViolation, SafetyLimits};
pub use settings::{LogSettings, MachineSettings, MotionSettings, Settings, SettingsError};
