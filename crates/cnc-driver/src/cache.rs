//! 状态缓存
//!
//! 唯一持有最新快照的组件。快照以 `Arc` 形式共享，读取方无法修改。

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use cnc_interface::MachineInterface;
use tracing::trace;

use crate::{DriverError, MachineSnapshot, RetryPolicy};

/// 状态缓存 / 轮询器
#[derive(Debug)]
pub struct StatusCache {
    latest: ArcSwapOption<MachineSnapshot>,
    policy: RetryPolicy,
}

impl StatusCache {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            latest: ArcSwapOption::empty(),
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// 重新读取机床状态
    ///
    /// 按重试策略轮询；成功时替换缓存并返回新快照，
    /// 重试耗尽时返回 `DriverError::PollFailed`，缓存保持不变。
    ///
    /// # 阻塞行为
    ///
    /// 重试退避期间阻塞当前线程。
    pub fn refresh<I>(&self, iface: &mut I) -> Result<Arc<MachineSnapshot>, DriverError>
    where
        I: MachineInterface + ?Sized,
    {
        let result = self.policy.run(|attempt| -> Result<MachineSnapshot, DriverError> {
            trace!(attempt, "polling machine status");
            let raw = iface.poll_status()?;
            MachineSnapshot::from_raw(raw)
        });

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.latest.store(Some(Arc::clone(&snapshot)));
                Ok(snapshot)
            },
            Err(exhausted) => Err(DriverError::PollFailed {
                attempts: exhausted.attempts,
                source: Box::new(exhausted.last_error),
            }),
        }
    }

    /// 最近一次成功轮询的快照
    pub fn snapshot(&self) -> Option<Arc<MachineSnapshot>> {
        self.latest.load_full()
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
