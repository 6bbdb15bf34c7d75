//! 安全门
//!
//! 运动前的前置条件检查。关节数量与回零操作使用同一个推导函数
//! （[`MachineSnapshot::joint_count`]），同一快照上两者结果一致。

use cnc_driver::MachineSnapshot;

use crate::CncError;

/// 所有已配置关节必须已回零
///
/// 只检查前 N 个回零标志（N 由轴掩码推导，缺失时为 3）；
/// 标志列表缺失或短于 N 时视为未回零。
pub fn require_homed(snapshot: &MachineSnapshot) -> Result<(), CncError> {
    if snapshot.is_homed() {
        Ok(())
    } else {
        Err(CncError::NotHomed)
    }
}

/// 任务状态不能是 ESTOP
pub fn require_not_estopped(snapshot: &MachineSnapshot) -> Result<(), CncError> {
    if snapshot.is_estopped() {
        Err(CncError::EStopActive)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnc_interface::{InterpState, RawStatus, TaskState};

    fn snapshot(homed: Option<Vec<bool>>, axis_mask: Option<u32>, task: TaskState) -> MachineSnapshot {
        MachineSnapshot::from_raw(RawStatus {
            position: vec![0.0; 9],
            homed,
            axis_mask,
            task_state: task.as_u8(),
            interp_state: InterpState::Idle.code(),
            current_velocity: 0.0,
        })
        .unwrap()
    }

    #[test]
    fn test_require_homed() {
        let ok = snapshot(Some(vec![true, true, true]), Some(0b111), TaskState::On);
        assert!(require_homed(&ok).is_ok());

        let partial = snapshot(Some(vec![true, false, true]), Some(0b111), TaskState::On);
        assert!(matches!(require_homed(&partial), Err(CncError::NotHomed)));
    }

    #[test]
    fn test_require_homed_ignores_unconfigured_joints() {
        // 两轴机床：第 3 个关节未回零也不影响
        let two_axis = snapshot(Some(vec![true, true, false, false]), Some(0b11), TaskState::On);
        assert!(require_homed(&two_axis).is_ok());
    }

    #[test]
    fn test_require_homed_fails_closed() {
        let missing = snapshot(None, None, TaskState::On);
        assert!(require_homed(&missing).is_err());

        let short = snapshot(Some(vec![true, true]), None, TaskState::On);
        assert!(require_homed(&short).is_err());
    }

    #[test]
    fn test_require_not_estopped() {
        assert!(require_not_estopped(&snapshot(None, None, TaskState::Off)).is_ok());
        assert!(require_not_estopped(&snapshot(None, None, TaskState::EstopReset)).is_ok());
        assert!(matches!(
            require_not_estopped(&snapshot(None, None, TaskState::Estop)),
            Err(CncError::EStopActive)
        ));
    }
}
