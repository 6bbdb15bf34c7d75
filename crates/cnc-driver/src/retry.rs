//! 有界重试策略
//!
//! 线性退避：第 N 次失败后等待 `base_interval × N`，最后一次失败后不再等待。

use std::fmt;
use std::time::Duration;

use tracing::warn;

/// 默认最大尝试次数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 重试耗尽
#[derive(Debug)]
pub struct Exhausted<E> {
    /// 实际尝试次数
    pub attempts: u32,
    /// 最后一次失败的错误
    pub last_error: E,
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（包含第一次）
    pub max_attempts: u32,
    /// 退避基准间隔
    pub base_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_interval: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_interval: Duration) -> Self {
        Self {
            max_attempts,
            base_interval,
        }
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_interval.saturating_mul(attempt)
    }

    /// 执行操作，失败时按策略重试
    ///
    /// 闭包参数为当前尝试序号（从 1 开始）。
    ///
    /// # 阻塞行为
    ///
    /// 退避期间阻塞当前线程。
    pub fn run<T, E, F>(&self, op: F) -> Result<T, Exhausted<E>>
    where
        E: fmt::Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        self.run_with_sleep(op, std::thread::sleep)
    }

    /// 同 [`run`](Self::run)，但由调用方提供等待函数
    pub fn run_with_sleep<T, E, F, S>(&self, mut op: F, mut sleep: S) -> Result<T, Exhausted<E>>
    where
        E: fmt::Display,
        F: FnMut(u32) -> Result<T, E>,
        S: FnMut(Duration),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(attempt, max_attempts, ?delay, error = %e, "attempt failed, retrying");
                    sleep(delay);
                    attempt += 1;
                },
                Err(e) => {
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy::new(3, Duration::from_millis(50));
        assert_eq!(policy.backoff(1), Duration::from_millis(50));
        assert_eq!(policy.backoff(2), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(150));
    }

    #[test]
    fn test_succeeds_on_third_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let mut sleeps = Vec::new();

        let result = policy.run_with_sleep(
            |attempt| if attempt < 3 { Err("transient") } else { Ok(attempt) },
            |d| sleeps.push(d),
        );

        assert_eq!(result.unwrap(), 3);
        assert_eq!(sleeps, vec![Duration::from_millis(10), Duration::from_millis(20)]);
    }

    #[test]
    fn test_exhausted_after_max_attempts() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let mut sleeps = 0;

        let result: Result<(), _> = policy.run_with_sleep(
            |_| {
                calls += 1;
                Err("down")
            },
            |_| sleeps += 1,
        );

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last_error, "down");
        assert_eq!(calls, 3);
        // 最后一次失败后不再等待
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), _> = policy.run(|_| {
            calls += 1;
            Err("fail")
        });
        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls, 1);
    }
}
