//! 模式时序器
//!
//! 每个公开操作都按固定顺序驱动机床接口：
//! 轮询 → 安全检查 → 模式切换 → 下发 → 等待。
//!
//! # 阻塞行为
//!
//! 所有方法都是阻塞调用，`wait = true` 时会一直等到运动完成或回零完成。
//! 同一台机床的操作必须由调用方串行化（见 `cnc-sdk` 的 `Session`）。

use std::sync::Arc;

use cnc_driver::{DriverConfig, DriverError, MachineDriver, MachineSnapshot};
use cnc_interface::{ErrorKind, InterfaceError, MachineInterface, MachineMode, TaskState};
use tracing::{debug, error, info, warn};

use crate::gcode::{MotionCommand, build_command};
use crate::{CncError, MachineStatus, Position, safety};

/// 机床控制器
#[derive(Debug)]
pub struct CncController {
    driver: MachineDriver,
}

impl CncController {
    pub fn new(driver: MachineDriver) -> Self {
        Self { driver }
    }

    /// 接管接口会话并创建控制器
    pub fn connect<I>(iface: I, config: DriverConfig) -> Self
    where
        I: MachineInterface + 'static,
    {
        Self::new(MachineDriver::new(iface, config))
    }

    pub fn driver(&self) -> &MachineDriver {
        &self.driver
    }

    /// 重新轮询状态
    pub fn refresh(&self) -> Result<Arc<MachineSnapshot>, CncError> {
        Ok(self.driver.refresh()?)
    }

    // ==================== 状态查询 ====================

    pub fn position(&self) -> Result<Position, CncError> {
        let snapshot = self.refresh()?;
        Ok(Position::from(snapshot.as_ref()))
    }

    pub fn status(&self) -> Result<MachineStatus, CncError> {
        let snapshot = self.refresh()?;
        Ok(MachineStatus::from(snapshot.as_ref()))
    }

    // ==================== 上电时序 ====================

    /// 确保机床处于 ON 状态
    ///
    /// ESTOP 时先复位并重新轮询；仍不是 ON 时下发 ON。已经是 ON 时只做一次轮询。
    pub fn ensure_machine_on(&self) -> Result<(), CncError> {
        let mut task_state = self.refresh()?.task_state;

        if task_state.is_estop() {
            debug!("machine in E-stop, resetting before power on");
            self.driver.set_task_state(TaskState::EstopReset)?;
            task_state = self.refresh()?.task_state;
        }

        if !task_state.is_on() {
            debug!(%task_state, "powering machine on");
            self.driver.set_task_state(TaskState::On)?;
        }
        Ok(())
    }

    // ==================== 运动 ====================

    /// 绝对定位，返回下发的指令文本
    pub fn move_absolute(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        feed_rate: f64,
        rapid: bool,
        wait: bool,
    ) -> Result<String, CncError> {
        let command = MotionCommand {
            x,
            y,
            z,
            feed_rate,
            rapid,
            ..MotionCommand::absolute()
        };
        self.execute_move(&command, wait)
    }

    /// 相对定位，返回下发的指令文本
    pub fn move_relative(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        feed_rate: f64,
        rapid: bool,
        wait: bool,
    ) -> Result<String, CncError> {
        let command = MotionCommand {
            x,
            y,
            z,
            feed_rate,
            rapid,
            ..MotionCommand::relative()
        };
        self.execute_move(&command, wait)
    }

    /// 执行一条运动指令
    ///
    /// 时序：清空旧错误 → 上电 → 回零检查 → MDI 模式 → 构建并下发 →
    /// （可选）等待解释器空闲 → 检查错误队列。
    ///
    /// # 错误
    ///
    /// - `CncError::NotHomed`: 未回零，指令不会被构建和下发
    /// - `CncError::Motion`: 控制器在下发时拒绝指令，或下发后错误队列非空；
    ///   携带错误文本和指令文本
    /// - `CncError::Connection`: 轮询或下发失败
    pub fn execute_move(&self, command: &MotionCommand, wait: bool) -> Result<String, CncError> {
        let stale = self.driver.drain_errors()?;
        if !stale.is_empty() {
            warn!(count = stale.len(), first = %stale[0], "discarding stale controller errors");
        }

        self.ensure_machine_on()?;

        let snapshot = self.refresh()?;
        safety::require_homed(&snapshot)?;

        debug!("switching to MDI mode");
        self.driver.set_mode(MachineMode::Mdi)?;

        let gcode = build_command(command);
        match self.driver.send_mdi(&gcode) {
            Ok(()) => {},
            Err(DriverError::Interface(InterfaceError::Rejected(text))) => {
                error!(gcode = %gcode, error = %text, "motion command rejected at dispatch");
                return Err(CncError::Motion {
                    kind: ErrorKind::OperatorError,
                    text,
                    command: gcode,
                });
            },
            Err(e) => return Err(e.into()),
        }

        if wait {
            debug!(gcode = %gcode, "waiting for interpreter idle");
            self.driver.wait_for_interp_idle()?;
        }

        let errors = self.driver.drain_errors()?;
        if let Some(first) = errors.into_iter().next() {
            error!(gcode = %gcode, error = %first, "motion command failed");
            return Err(CncError::Motion {
                kind: first.kind,
                text: first.text,
                command: gcode,
            });
        }

        info!(gcode = %gcode, wait, "motion command executed");
        Ok(gcode)
    }

    // ==================== 回零 ====================

    /// 所有已配置关节回零，返回关节数量
    ///
    /// 在 MANUAL 模式下按 0..N-1 顺序逐个下发；`wait = true` 时等待前 N 个
    /// 回零标志全部为 true。
    pub fn home_all(&self, wait: bool) -> Result<usize, CncError> {
        self.ensure_machine_on()?;

        debug!("switching to MANUAL mode for homing");
        self.driver.set_mode(MachineMode::Manual)?;

        let joints = self.refresh()?.joint_count();
        for joint in 0..joints {
            self.driver.home_joint(joint)?;
        }

        if wait {
            debug!(joints, "waiting for homing to complete");
            self.driver.wait_for_homed(joints)?;
        }

        info!(joints, wait, "homing dispatched");
        Ok(joints)
    }

    // ==================== 电源和急停 ====================

    pub fn set_power(&self, on: bool) -> Result<(), CncError> {
        if on { self.machine_on() } else { self.machine_off() }
    }

    /// 上电（E-stop 激活时拒绝，不会自动复位）
    pub fn machine_on(&self) -> Result<(), CncError> {
        let snapshot = self.refresh()?;
        safety::require_not_estopped(&snapshot)?;

        self.driver.set_task_state(TaskState::On)?;
        info!("machine turned on");
        Ok(())
    }

    pub fn machine_off(&self) -> Result<(), CncError> {
        self.driver.set_task_state(TaskState::Off)?;
        info!("machine turned off");
        Ok(())
    }

    /// 触发急停
    ///
    /// 没有任何前置条件，在任何状态下都会下发。
    pub fn emergency_stop(&self) -> Result<(), CncError> {
        self.driver.set_task_state(TaskState::Estop)?;
        warn!("emergency stop activated");
        Ok(())
    }

    pub fn reset_emergency_stop(&self) -> Result<(), CncError> {
        self.driver.set_task_state(TaskState::EstopReset)?;
        info!("emergency stop reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnc_interface::{ErrorKind, MockCall, MockMachine};
    use std::time::Duration;

    fn controller(machine: &MockMachine) -> CncController {
        CncController::connect(
            machine.clone(),
            DriverConfig::with_poll_interval(Duration::from_millis(1)),
        )
    }

    #[test]
    fn test_ensure_on_from_estop() {
        let machine = MockMachine::new();
        let cnc = controller(&machine);

        cnc.ensure_machine_on().unwrap();
        assert_eq!(machine.task_state(), TaskState::On);
        assert_eq!(
            machine.calls(),
            vec![
                MockCall::State(TaskState::EstopReset),
                MockCall::WaitComplete,
                MockCall::State(TaskState::On),
                MockCall::WaitComplete,
            ]
        );
    }

    #[test]
    fn test_ensure_on_is_idempotent() {
        let machine = MockMachine::ready();
        let cnc = controller(&machine);

        cnc.ensure_machine_on().unwrap();
        assert!(machine.calls().is_empty());
        assert_eq!(machine.poll_count(), 1);
    }

    #[test]
    fn test_move_dispatch_order() {
        let machine = MockMachine::ready();
        let cnc = controller(&machine);

        let gcode = cnc
            .move_absolute(Some(10.0), Some(20.0), Some(5.0), 1000.0, false, true)
            .unwrap();
        assert_eq!(gcode, "G21 G90 G1 X10.0000 Y20.0000 Z5.0000 F1000.0000");
        assert_eq!(
            machine.calls(),
            vec![
                MockCall::Mode(MachineMode::Mdi),
                MockCall::WaitComplete,
                MockCall::Mdi(gcode),
                MockCall::WaitComplete,
            ]
        );
        assert_eq!(machine.position(), [10.0, 20.0, 5.0]);
    }

    #[test]
    fn test_stale_errors_are_not_attributed() {
        let machine = MockMachine::ready();
        machine.push_error(ErrorKind::OperatorError, "left over from last time");
        let cnc = controller(&machine);

        assert!(cnc.move_relative(Some(1.0), None, None, 500.0, false, true).is_ok());
        assert_eq!(machine.pending_errors(), 0);
    }

    #[test]
    fn test_motion_error_carries_command() {
        let machine = MockMachine::ready();
        machine.reject_mdi("Requested move exceeds soft limit");
        let cnc = controller(&machine);

        let err = cnc
            .move_absolute(Some(999.0), None, None, 1000.0, false, false)
            .unwrap_err();
        match err {
            CncError::Motion { kind, text, command } => {
                assert_eq!(kind, ErrorKind::OperatorError);
                assert_eq!(text, "Requested move exceeds soft limit");
                assert_eq!(command, "G21 G90 G1 X999.0000 F1000.0000");
            },
            other => panic!("Expected Motion error, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_rejection_is_a_motion_error() {
        let machine = MockMachine::ready();
        machine.refuse(MockCall::Mdi(String::new()), "bad word");
        let cnc = controller(&machine);

        let err = cnc
            .move_absolute(Some(1.0), None, None, 1000.0, false, true)
            .unwrap_err();
        assert_eq!(err.code(), "MOTION_ERROR");
        assert!(err.is_recoverable());
        match err {
            CncError::Motion { kind, text, command } => {
                assert_eq!(kind, ErrorKind::OperatorError);
                assert_eq!(text, "bad word");
                assert_eq!(command, "G21 G90 G1 X1.0000 F1000.0000");
            },
            other => panic!("Expected Motion error, got {:?}", other),
        }
        // 拒绝后不再等待解释器
        assert_eq!(machine.poll_count(), 2);
    }

    #[test]
    fn test_failed_estop_reset_aborts_move() {
        let machine = MockMachine::new();
        machine.set_homed(Some(vec![true, true, true]));
        machine.refuse(MockCall::State(TaskState::EstopReset), "reset interlock open");
        let cnc = controller(&machine);

        let err = cnc
            .move_absolute(Some(1.0), None, None, 1000.0, false, true)
            .unwrap_err();
        assert!(matches!(
            err,
            CncError::Connection(DriverError::Interface(InterfaceError::Rejected(ref text)))
                if text == "reset interlock open"
        ));
        assert_eq!(machine.calls(), vec![MockCall::State(TaskState::EstopReset)]);
        assert!(machine.mdi_commands().is_empty());
        assert_eq!(machine.task_state(), TaskState::Estop);
    }

    #[test]
    fn test_failed_mode_switch_aborts_move() {
        let machine = MockMachine::ready();
        machine.refuse(MockCall::Mode(MachineMode::Mdi), "mode switch refused");
        let cnc = controller(&machine);

        let err = cnc.move_relative(None, Some(2.0), None, 500.0, false, true).unwrap_err();
        assert_eq!(err.code(), "CONNECTION_ERROR");
        assert!(err.to_string().contains("mode switch refused"));
        assert_eq!(machine.calls(), vec![MockCall::Mode(MachineMode::Mdi)]);
        assert!(machine.mdi_commands().is_empty());
    }

    #[test]
    fn test_failed_power_on_aborts_homing() {
        let machine = MockMachine::new();
        machine.refuse(MockCall::State(TaskState::On), "amplifier fault");
        let cnc = controller(&machine);

        let err = cnc.home_all(true).unwrap_err();
        assert!(err.to_string().contains("amplifier fault"));
        assert!(!machine.calls().iter().any(|c| matches!(c, MockCall::Home(_) | MockCall::Mode(_))));
    }

    #[test]
    fn test_move_without_wait_skips_idle_poll() {
        let machine = MockMachine::ready();
        machine.set_mdi_busy_polls(100);
        let cnc = controller(&machine);

        cnc.move_absolute(Some(1.0), None, None, 1000.0, true, false).unwrap();
        // ensure_on 一次 + 回零检查一次
        assert_eq!(machine.poll_count(), 2);
    }

    #[test]
    fn test_home_all_uses_axis_mask() {
        let machine = MockMachine::new();
        machine.set_axis_mask(Some(0b1_0000_0111));
        let cnc = controller(&machine);

        let joints = cnc.home_all(true).unwrap();
        assert_eq!(joints, 4);
        assert_eq!(machine.mode(), MachineMode::Manual);

        let homes: Vec<_> = machine
            .calls()
            .into_iter()
            .filter(|c| matches!(c, MockCall::Home(_)))
            .collect();
        assert_eq!(
            homes,
            vec![MockCall::Home(0), MockCall::Home(1), MockCall::Home(2), MockCall::Home(3)]
        );
        assert!(machine.homed().unwrap()[..4].iter().all(|&h| h));
    }

    #[test]
    fn test_home_all_without_mask_defaults_to_three() {
        let machine = MockMachine::new();
        machine.set_axis_mask(None);
        let cnc = controller(&machine);

        assert_eq!(cnc.home_all(false).unwrap(), 3);
    }

    #[test]
    fn test_machine_on_refuses_estop() {
        let machine = MockMachine::new();
        let cnc = controller(&machine);

        assert!(matches!(cnc.set_power(true), Err(CncError::EStopActive)));
        assert!(machine.calls().is_empty());
    }

    #[test]
    fn test_machine_off_from_estop_has_no_preconditions() {
        let machine = MockMachine::new();
        let cnc = controller(&machine);

        cnc.set_power(false).unwrap();
        assert_eq!(
            machine.calls(),
            vec![MockCall::State(TaskState::Off), MockCall::WaitComplete]
        );
        assert_eq!(machine.poll_count(), 0);
        // 控制器在 E-stop 下忽略 OFF
        assert_eq!(machine.task_state(), TaskState::Estop);
    }

    #[test]
    fn test_emergency_stop_from_any_state() {
        for state in [TaskState::Off, TaskState::On, TaskState::Estop, TaskState::EstopReset] {
            let machine = MockMachine::new();
            machine.set_task_state(state);
            let cnc = controller(&machine);

            cnc.emergency_stop().unwrap();
            assert_eq!(machine.task_state(), TaskState::Estop);
        }
    }

    #[test]
    fn test_connection_failure_aborts_move() {
        let machine = MockMachine::ready();
        machine.disconnect();
        let cnc = controller(&machine);

        let err = cnc.move_absolute(Some(1.0), None, None, 1000.0, false, true).unwrap_err();
        assert_eq!(err.code(), "CONNECTION_ERROR");
    }
}
