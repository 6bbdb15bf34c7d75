//! 移动命令

use clap::{Args, ValueEnum};
use cnc_sdk::{MoveRequest, OperationOutcome, SessionError, SessionHandle};

/// 定位模式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    /// 绝对坐标（G90）
    #[value(alias = "absolute")]
    Abs,
    /// 相对位移（G91）
    #[value(alias = "relative")]
    Rel,
}

/// 移动命令参数
#[derive(Args, Debug, Clone)]
pub struct MoveCommand {
    #[arg(value_enum)]
    pub mode: MoveMode,

    /// X 轴（mm）
    #[arg(long, allow_negative_numbers = true)]
    pub x: Option<f64>,

    /// Y 轴（mm）
    #[arg(long, allow_negative_numbers = true)]
    pub y: Option<f64>,

    /// Z 轴（mm）
    #[arg(long, allow_negative_numbers = true)]
    pub z: Option<f64>,

    /// 进给速度（mm/min），默认取配置中的 default_feed_rate
    #[arg(short, long)]
    pub feed: Option<f64>,

    /// 快速移动（G0，忽略进给速度）
    #[arg(long)]
    pub rapid: bool,

    /// 下发后立即返回，不等待运动完成
    #[arg(long)]
    pub no_wait: bool,
}

impl MoveCommand {
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            x: self.x,
            y: self.y,
            z: self.z,
            feed_rate: self.feed,
            rapid: self.rapid,
            wait: !self.no_wait,
        }
    }

    pub fn execute(&self, handle: &SessionHandle) -> Result<OperationOutcome, SessionError> {
        let request = self.request();
        match self.mode {
            MoveMode::Abs => handle.move_absolute(request),
            MoveMode::Rel => handle.move_relative(request),
        }
    }
}
