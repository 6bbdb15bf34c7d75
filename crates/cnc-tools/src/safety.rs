//! # 安全限制
//!
//! 调用方参数的策略检查，在任何机床交互之前执行。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 参数越界
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid parameter '{param}': {reason}")]
pub struct LimitViolation {
    /// 参数名（如 `x`、`feed_rate`）
    pub param: String,
    /// 原因
    pub reason: String,
}

impl LimitViolation {
    fn new(param: &str, reason: impl Into<String>) -> Self {
        Self {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

/// 安全限制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyLimits {
    /// 进给速度下限（mm/min）
    pub min_feed_rate: f64,

    /// 进给速度上限（mm/min）
    pub max_feed_rate: f64,

    /// 绝对坐标范围（±mm）
    pub coordinate_limit: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            min_feed_rate: 1.0,
            max_feed_rate: 10_000.0,
            coordinate_limit: 10_000.0,
        }
    }
}

impl SafetyLimits {
    /// 检查进给速度是否在 `[min_feed_rate, max_feed_rate]` 内
    pub fn check_feed_rate(&self, feed_rate: f64) -> Result<(), LimitViolation> {
        if !feed_rate.is_finite() {
            return Err(LimitViolation::new("feed_rate", "must be a finite number"));
        }
        if feed_rate < self.min_feed_rate || feed_rate > self.max_feed_rate {
            return Err(LimitViolation::new(
                "feed_rate",
                format!(
                    "Feed rate must be between {} and {} mm/min",
                    self.min_feed_rate, self.max_feed_rate
                ),
            ));
        }
        Ok(())
    }

    /// 检查绝对目标坐标
    pub fn check_coordinate(&self, axis: &str, value: f64) -> Result<(), LimitViolation> {
        self.check_displacement(axis, value)?;
        if value.abs() > self.coordinate_limit {
            return Err(LimitViolation::new(
                axis,
                format!(
                    "Coordinate must be between -{} and {} mm",
                    self.coordinate_limit, self.coordinate_limit
                ),
            ));
        }
        Ok(())
    }

    /// 检查相对位移（只要求是有限值）
    pub fn check_displacement(&self, axis: &str, value: f64) -> Result<(), LimitViolation> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(LimitViolation::new(axis, "must be a finite number"))
        }
    }
}
