//! G-code 指令构建
//!
//! 纯函数：把结构化运动参数转换为单行 MDI 指令。
//!
//! 字顺序固定为 `G21 G90|G91 G0|G1 X Y Z F`，下游工具按文本解析指令，
//! 顺序和小数位数必须保持不变。

use std::fmt;

/// 未指定时使用的进给速度（mm/min）
pub const DEFAULT_FEED_RATE: f64 = 1000.0;

/// 定位模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PositioningMode {
    /// G90
    #[default]
    Absolute,
    /// G91
    Relative,
}

impl PositioningMode {
    pub fn word(self) -> &'static str {
        match self {
            PositioningMode::Absolute => "G90",
            PositioningMode::Relative => "G91",
        }
    }
}

/// 单条定位指令
///
/// 未设置的轴不会出现在生成的指令里（不会补 0）。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionCommand {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    /// 进给速度（mm/min），只对非快速移动有意义
    pub feed_rate: f64,
    /// G0 快速移动
    pub rapid: bool,
    pub mode: PositioningMode,
}

impl Default for MotionCommand {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            z: None,
            feed_rate: DEFAULT_FEED_RATE,
            rapid: false,
            mode: PositioningMode::Absolute,
        }
    }
}

impl MotionCommand {
    /// 绝对定位指令
    pub fn absolute() -> Self {
        Self::default()
    }

    /// 相对定位指令
    pub fn relative() -> Self {
        Self {
            mode: PositioningMode::Relative,
            ..Self::default()
        }
    }

    pub fn x(mut self, value: f64) -> Self {
        self.x = Some(value);
        self
    }

    pub fn y(mut self, value: f64) -> Self {
        self.y = Some(value);
        self
    }

    pub fn z(mut self, value: f64) -> Self {
        self.z = Some(value);
        self
    }

    pub fn feed_rate(mut self, feed_rate: f64) -> Self {
        self.feed_rate = feed_rate;
        self
    }

    pub fn rapid(mut self, rapid: bool) -> Self {
        self.rapid = rapid;
        self
    }

    /// 已设置的轴（按 X、Y、Z 顺序）
    pub fn axes(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        [('X', self.x), ('Y', self.y), ('Z', self.z)]
            .into_iter()
            .filter_map(|(axis, value)| value.map(|v| (axis, v)))
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("G21 ")?;
        f.write_str(self.mode.word())?;
        f.write_str(if self.rapid { " G0" } else { " G1" })?;
        for (axis, value) in self.axes() {
            write!(f, " {}{:.4}", axis, value)?;
        }
        if !self.rapid {
            write!(f, " F{:.4}", self.feed_rate)?;
        }
        Ok(())
    }
}

/// 构建 MDI 指令文本
pub fn build_command(command: &MotionCommand) -> String {
    command.to_string()
}
