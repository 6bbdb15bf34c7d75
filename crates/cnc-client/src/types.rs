//! 结果类型

use cnc_driver::MachineSnapshot;

/// 当前位置（mm，A 轴为度）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// 少于 4 轴时为 0
    pub a: f64,
}

impl From<&MachineSnapshot> for Position {
    fn from(snapshot: &MachineSnapshot) -> Self {
        Self {
            x: snapshot.axis(0),
            y: snapshot.axis(1),
            z: snapshot.axis(2),
            a: snapshot.axis(3),
        }
    }
}

/// 机床状态报告
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineStatus {
    pub position: Position,
    /// 控制器报告的完整回零标志列表
    pub homed: Vec<bool>,
    pub estop_active: bool,
    pub machine_on: bool,
    /// 解释器状态原始码
    pub interp_state: u8,
    /// 当前进给速度（mm/min）
    pub feed_rate: f64,
}

impl From<&MachineSnapshot> for MachineStatus {
    fn from(snapshot: &MachineSnapshot) -> Self {
        Self {
            position: Position::from(snapshot),
            homed: snapshot.homed.to_vec(),
            estop_active: snapshot.is_estopped(),
            machine_on: snapshot.is_on(),
            interp_state: snapshot.interp_state.code(),
            feed_rate: snapshot.current_velocity * 60.0,
        }
    }
}

/// 操作结果
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationOutcome {
    pub success: bool,
    /// 下发的指令文本（如有）
    #[cfg_attr(feature = "serde", serde(rename = "gcode", skip_serializing_if = "Option::is_none"))]
    pub command: Option<String>,
    /// 急停操作后的 E-stop 状态
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub estop_active: Option<bool>,
    /// 电源操作后的上电状态
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub machine_on: Option<bool>,
    pub message: String,
}

impl OperationOutcome {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            command: None,
            estop_active: None,
            machine_on: None,
            message: message.into(),
        }
    }

    pub fn with_command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::done(message)
        }
    }

    pub fn with_estop_active(mut self, active: bool) -> Self {
        self.estop_active = Some(active);
        self
    }

    pub fn with_machine_on(mut self, on: bool) -> Self {
        self.machine_on = Some(on);
        self
    }
}
