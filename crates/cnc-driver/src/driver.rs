//! 机床驱动
//!
//! 持有唯一的机床接口会话，提供轮询、阻塞式下发和完成等待。
//!
//! # 阻塞行为
//!
//! 本模块所有方法都是**阻塞的 (Blocking)**。等待类方法按 `poll_interval`
//! 重新轮询，默认没有期限（运动本身可能持续任意时长）。
//! 请不要在必须保持响应的上下文（如 Tokio 执行器线程）中直接调用，
//! 应该把每个机床会话放在独立的工作线程上。

use std::sync::Arc;
use std::time::{Duration, Instant};

use cnc_interface::{MachineInterface, MachineMode, TaskState};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{DriverError, MachineSnapshot, PendingError, RetryPolicy, StatusCache, queue};

/// 驱动配置
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// 完成等待的轮询间隔
    pub poll_interval: Duration,
    /// 状态轮询的重试策略
    pub retry: RetryPolicy,
    /// 完成等待的期限，`None` 表示无限等待
    pub wait_timeout: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::with_poll_interval(Duration::from_millis(50))
    }
}

impl DriverConfig {
    /// 使用给定轮询间隔，重试退避基准与之相同
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            retry: RetryPolicy::new(crate::retry::DEFAULT_MAX_ATTEMPTS, poll_interval),
            wait_timeout: None,
        }
    }

    pub fn wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }
}

/// 机床驱动
pub struct MachineDriver {
    iface: Mutex<Box<dyn MachineInterface>>,
    cache: StatusCache,
    config: DriverConfig,
}

impl std::fmt::Debug for MachineDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineDriver")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MachineDriver {
    /// 接管机床接口会话
    pub fn new<I>(iface: I, config: DriverConfig) -> Self
    where
        I: MachineInterface + 'static,
    {
        Self {
            iface: Mutex::new(Box::new(iface)),
            cache: StatusCache::new(config.retry),
            config,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 重新轮询状态（带重试），见 [`StatusCache::refresh`]
    pub fn refresh(&self) -> Result<Arc<MachineSnapshot>, DriverError> {
        let mut iface = self.iface.lock();
        self.cache.refresh(&mut **iface)
    }

    /// 最近一次成功轮询的快照
    pub fn snapshot(&self) -> Option<Arc<MachineSnapshot>> {
        self.cache.snapshot()
    }

    /// 清空控制器错误队列，返回取出的所有消息
    pub fn drain_errors(&self) -> Result<Vec<PendingError>, DriverError> {
        let mut iface = self.iface.lock();
        queue::drain(&mut **iface)
    }

    /// 下发任务状态切换并等待控制器确认
    pub fn set_task_state(&self, target: TaskState) -> Result<(), DriverError> {
        let mut iface = self.iface.lock();
        debug!(%target, "dispatching task state transition");
        iface.dispatch_state(target)?;
        iface.wait_complete()?;
        Ok(())
    }

    /// 下发模式切换并等待控制器确认
    pub fn set_mode(&self, mode: MachineMode) -> Result<(), DriverError> {
        let mut iface = self.iface.lock();
        debug!(%mode, "dispatching mode switch");
        iface.dispatch_mode(mode)?;
        iface.wait_complete()?;
        Ok(())
    }

    /// 下发 MDI 指令并等待控制器确认（不等待运动完成）
    pub fn send_mdi(&self, command: &str) -> Result<(), DriverError> {
        let mut iface = self.iface.lock();
        debug!(command, "dispatching MDI command");
        iface.dispatch_mdi(command)?;
        iface.wait_complete()?;
        Ok(())
    }

    /// 下发单个关节的回零请求（只下发，不等待）
    pub fn home_joint(&self, joint: usize) -> Result<(), DriverError> {
        let mut iface = self.iface.lock();
        debug!(joint, "dispatching home request");
        iface.dispatch_home(joint)?;
        Ok(())
    }

    /// 按轮询间隔重新轮询，直到 `predicate` 成立
    ///
    /// # 错误
    ///
    /// - `DriverError::PollFailed`: 轮询重试耗尽（连接失败会中断等待）
    /// - `DriverError::Timeout`: 配置了 `wait_timeout` 且已超时
    pub fn wait_until<F>(&self, what: &str, predicate: F) -> Result<Arc<MachineSnapshot>, DriverError>
    where
        F: Fn(&MachineSnapshot) -> bool,
    {
        let start = Instant::now();

        loop {
            let snapshot = self.refresh()?;
            if predicate(&snapshot) {
                trace!(what, elapsed = ?start.elapsed(), "wait condition met");
                return Ok(snapshot);
            }

            let mut sleep_duration = self.config.poll_interval;
            if let Some(timeout) = self.config.wait_timeout {
                let remaining = timeout.saturating_sub(start.elapsed());
                if remaining.is_zero() {
                    return Err(DriverError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                sleep_duration = sleep_duration.min(remaining);
            }

            std::thread::sleep(sleep_duration);
        }
    }

    /// 等待解释器回到 IDLE
    pub fn wait_for_interp_idle(&self) -> Result<Arc<MachineSnapshot>, DriverError> {
        self.wait_until("interpreter idle", |s| s.interp_state.is_idle())
    }

    /// 等待前 `joints` 个关节全部回零
    pub fn wait_for_homed(&self, joints: usize) -> Result<Arc<MachineSnapshot>, DriverError> {
        self.wait_until("joints homed", move |s| s.homed_for(joints))
    }
}
