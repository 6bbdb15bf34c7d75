//! 服务层
//!
//! 在控制器之上补充默认进给速度和参数校验，返回传输层直接可用的结果。
//! 校验失败时不会与机床发生任何交互。

use cnc_driver::DriverConfig;
use cnc_interface::MachineInterface;
use cnc_tools::{SafetyLimits, Settings};
use tracing::debug;

use crate::gcode::PositioningMode;
use crate::{CncController, CncError, MachineStatus, OperationOutcome, Position};

/// 运动请求
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MoveRequest {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    /// 未指定时使用配置中的默认进给速度
    pub feed_rate: Option<f64>,
    pub rapid: bool,
    /// 等待运动完成后再返回
    pub wait: bool,
}

impl Default for MoveRequest {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            z: None,
            feed_rate: None,
            rapid: false,
            wait: true,
        }
    }
}

/// 机床服务
#[derive(Debug)]
pub struct CncService {
    controller: CncController,
    default_feed_rate: f64,
    limits: SafetyLimits,
}

impl CncService {
    pub fn new(controller: CncController, settings: &Settings) -> Self {
        Self {
            controller,
            default_feed_rate: settings.motion.default_feed_rate,
            limits: settings.safety.clone(),
        }
    }

    /// 按配置创建驱动和控制器
    pub fn connect<I>(iface: I, settings: &Settings) -> Self
    where
        I: MachineInterface + 'static,
    {
        let config = DriverConfig::with_poll_interval(settings.poll_interval())
            .wait_timeout(settings.wait_timeout());
        Self::new(CncController::connect(iface, config), settings)
    }

    pub fn controller(&self) -> &CncController {
        &self.controller
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    pub fn get_position(&self) -> Result<Position, CncError> {
        self.controller.position()
    }

    pub fn get_status(&self) -> Result<MachineStatus, CncError> {
        self.controller.status()
    }

    pub fn execute_absolute_move(&self, request: &MoveRequest) -> Result<OperationOutcome, CncError> {
        let feed_rate = self.validate_move(request, PositioningMode::Absolute)?;
        let gcode = self.controller.move_absolute(
            request.x,
            request.y,
            request.z,
            feed_rate,
            request.rapid,
            request.wait,
        )?;
        Ok(OperationOutcome::with_command(gcode, "Move executed successfully"))
    }

    pub fn execute_relative_move(&self, request: &MoveRequest) -> Result<OperationOutcome, CncError> {
        let feed_rate = self.validate_move(request, PositioningMode::Relative)?;
        let gcode = self.controller.move_relative(
            request.x,
            request.y,
            request.z,
            feed_rate,
            request.rapid,
            request.wait,
        )?;
        Ok(OperationOutcome::with_command(gcode, "Relative move executed successfully"))
    }

    pub fn home_machine(&self, wait: bool) -> Result<OperationOutcome, CncError> {
        self.controller.home_all(wait)?;
        Ok(OperationOutcome::done("Machine homed successfully"))
    }

    pub fn trigger_emergency_stop(&self) -> Result<OperationOutcome, CncError> {
        self.controller.emergency_stop()?;
        Ok(OperationOutcome::done("Emergency stop activated").with_estop_active(true))
    }

    pub fn reset_emergency_stop(&self) -> Result<OperationOutcome, CncError> {
        self.controller.reset_emergency_stop()?;
        Ok(OperationOutcome::done("Emergency stop reset").with_estop_active(false))
    }

    pub fn set_machine_power(&self, on: bool) -> Result<OperationOutcome, CncError> {
        self.controller.set_power(on)?;
        let message = if on { "Machine turned on" } else { "Machine turned off" };
        Ok(OperationOutcome::done(message).with_machine_on(on))
    }

    /// 校验运动参数，返回实际使用的进给速度
    ///
    /// 绝对坐标检查范围，相对位移只要求有限值。进给速度对所有运动都检查，
    /// 快速移动也不例外（指令中不会出现 F 字）。
    fn validate_move(&self, request: &MoveRequest, mode: PositioningMode) -> Result<f64, CncError> {
        let feed_rate = request.feed_rate.unwrap_or(self.default_feed_rate);
        self.limits.check_feed_rate(feed_rate)?;

        for (axis, value) in [("x", request.x), ("y", request.y), ("z", request.z)] {
            let Some(value) = value else { continue };
            match mode {
                PositioningMode::Absolute => self.limits.check_coordinate(axis, value)?,
                PositioningMode::Relative => self.limits.check_displacement(axis, value)?,
            }
        }

        debug!(feed_rate, ?mode, "move request validated");
        Ok(feed_rate)
    }
}
