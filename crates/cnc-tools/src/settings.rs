//! # 应用配置
//!
//! TOML 配置文件 + 环境变量覆盖。
//!
//! ```toml
//! [machine]
//! poll_interval_ms = 50
//! # wait_timeout_ms = 60000
//!
//! [motion]
//! default_feed_rate = 1000.0
//!
//! [safety]
//! min_feed_rate = 1.0
//! max_feed_rate = 10000.0
//! coordinate_limit = 10000.0
//!
//! [log]
//! level = "info"
//! ```
//!
//! 缺失的段和字段取默认值。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::SafetyLimits;

/// 轮询间隔环境变量
pub const ENV_POLL_INTERVAL_MS: &str = "CNC_POLL_INTERVAL_MS";
/// 等待期限环境变量
pub const ENV_WAIT_TIMEOUT_MS: &str = "CNC_WAIT_TIMEOUT_MS";
/// 默认进给速度环境变量
pub const ENV_DEFAULT_FEED_RATE: &str = "CNC_DEFAULT_FEED_RATE";
/// 进给速度上限环境变量
pub const ENV_MAX_FEED_RATE: &str = "CNC_MAX_FEED_RATE";
/// 日志级别环境变量
pub const ENV_LOG_LEVEL: &str = "CNC_LOG_LEVEL";

/// 配置错误
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// 机床会话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// 完成等待轮询间隔（ms），同时作为轮询重试的退避基准
    pub poll_interval_ms: u64,

    /// 完成等待期限（ms），不设置则无限等待
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_timeout_ms: Option<u64>,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            wait_timeout_ms: None,
        }
    }
}

/// 运动配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// 请求未指定进给速度时使用（mm/min）
    pub default_feed_rate: f64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            default_feed_rate: 1000.0,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// 默认过滤级别（`RUST_LOG` 优先）
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub machine: MachineSettings,
    pub motion: MotionSettings,
    pub safety: SafetyLimits,
    pub log: LogSettings,
}

impl Settings {
    /// 从 TOML 文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// 文件存在时加载，否则使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "settings file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 应用进程环境变量覆盖
    pub fn apply_env(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// 应用覆盖，`lookup` 按变量名返回取值
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_var(&lookup, ENV_POLL_INTERVAL_MS)? {
            self.machine.poll_interval_ms = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_WAIT_TIMEOUT_MS)? {
            self.machine.wait_timeout_ms = Some(value);
        }
        if let Some(value) = parse_var(&lookup, ENV_DEFAULT_FEED_RATE)? {
            self.motion.default_feed_rate = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_MAX_FEED_RATE)? {
            self.safety.max_feed_rate = value;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log.level = level;
        }
        Ok(())
    }

    /// 检查配置一致性
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.machine.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "machine.poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.machine.wait_timeout_ms == Some(0) {
            return Err(SettingsError::Invalid(
                "machine.wait_timeout_ms must be positive when set".to_string(),
            ));
        }

        let safety = &self.safety;
        if !(safety.min_feed_rate.is_finite() && safety.min_feed_rate > 0.0) {
            return Err(SettingsError::Invalid(
                "safety.min_feed_rate must be positive".to_string(),
            ));
        }
        if !safety.max_feed_rate.is_finite() || safety.max_feed_rate < safety.min_feed_rate {
            return Err(SettingsError::Invalid(format!(
                "safety.max_feed_rate ({}) must not be below safety.min_feed_rate ({})",
                safety.max_feed_rate, safety.min_feed_rate
            )));
        }
        if !(safety.coordinate_limit.is_finite() && safety.coordinate_limit > 0.0) {
            return Err(SettingsError::Invalid(
                "safety.coordinate_limit must be positive".to_string(),
            ));
        }
        if safety.check_feed_rate(self.motion.default_feed_rate).is_err() {
            return Err(SettingsError::Invalid(format!(
                "motion.default_feed_rate ({}) is outside [{}, {}]",
                self.motion.default_feed_rate, safety.min_feed_rate, safety.max_feed_rate
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.machine.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.machine.wait_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(raw) => {
            let value = raw
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidEnv { var, value: raw.clone() })?;
            debug!(var, value = %raw, "settings override from environment");
            Ok(Some(value))
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.poll_interval(), Duration::from_millis(50));
        assert_eq!(settings.wait_timeout(), None);
        assert_eq!(settings.motion.default_feed_rate, 1000.0);
        assert_eq!(settings.safety.max_feed_rate, 10_000.0);
        assert_eq!(settings.log.level, "info");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [machine]
            wait_timeout_ms = 30000

            [safety]
            max_feed_rate = 5000.0
            "#,
        )
        .unwrap();

        assert_eq!(settings.machine.poll_interval_ms, 50);
        assert_eq!(settings.wait_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.safety.max_feed_rate, 5000.0);
        assert_eq!(settings.safety.min_feed_rate, 1.0);
        assert_eq!(settings.motion.default_feed_rate, 1000.0);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup_from(&[
                (ENV_POLL_INTERVAL_MS, "20"),
                (ENV_WAIT_TIMEOUT_MS, "1500"),
                (ENV_DEFAULT_FEED_RATE, "750.5"),
                (ENV_LOG_LEVEL, "debug"),
            ]))
            .unwrap();

        assert_eq!(settings.machine.poll_interval_ms, 20);
        assert_eq!(settings.machine.wait_timeout_ms, Some(1500));
        assert_eq!(settings.motion.default_feed_rate, 750.5);
        assert_eq!(settings.safety.max_feed_rate, 10_000.0);
        assert_eq!(settings.log.level, "debug");
    }

    #[test]
    fn test_bad_env_value() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(lookup_from(&[(ENV_MAX_FEED_RATE, "fast")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidEnv { var: ENV_MAX_FEED_RATE, .. }));
    }

    #[test]
    fn test_validate_rejects_inconsistent_values() {
        let mut settings = Settings::default();
        settings.machine.poll_interval_ms = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.safety.min_feed_rate = 500.0;
        settings.safety.max_feed_rate = 100.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.motion.default_feed_rate = 20_000.0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("default_feed_rate"));
    }

    #[test]
    fn test_toml_output_omits_unset_timeout() {
        let text = Settings::default().to_toml_string().unwrap();
        assert!(text.contains("poll_interval_ms = 50"));
        assert!(!text.contains("wait_timeout_ms"));
    }
}
