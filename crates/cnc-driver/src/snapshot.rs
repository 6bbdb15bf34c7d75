//! 机床状态快照
//!
//! 每次轮询都会创建新的快照，创建后只读。控制器可能不报告的字段
//! 在这里一次性补全默认值，调用方不再需要各自处理缺省情况。

use std::time::Instant;

use cnc_interface::{InterpState, RawStatus, TaskState};
use smallvec::SmallVec;

use crate::DriverError;

/// 轴掩码不可用时假定的关节数量（典型 3 轴机床）
pub const DEFAULT_JOINT_COUNT: usize = 3;

/// 由轴掩码推导已配置关节数量
///
/// 关节数量 = 掩码中置位的位数；掩码为 0 或缺失时返回 [`DEFAULT_JOINT_COUNT`]。
/// 回零检查和回零操作都必须通过此函数取得关节数量。
pub fn joint_count_from_mask(axis_mask: u32) -> usize {
    if axis_mask > 0 {
        axis_mask.count_ones() as usize
    } else {
        DEFAULT_JOINT_COUNT
    }
}

/// 机床状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct MachineSnapshot {
    /// 各轴位置
    pub position: SmallVec<[f64; 9]>,
    /// 回零标志（控制器未报告时为空）
    pub homed: SmallVec<[bool; 16]>,
    /// 轴掩码（控制器未报告时为 0）
    pub axis_mask: u32,
    pub task_state: TaskState,
    pub interp_state: InterpState,
    /// 当前速度（机床单位/秒）
    pub current_velocity: f64,
    /// 轮询时刻
    pub polled_at: Instant,
}

impl MachineSnapshot {
    /// 从控制器原始状态构建快照
    ///
    /// # 错误
    ///
    /// - `DriverError::InvalidStatus`: 任务状态码无法识别
    pub fn from_raw(raw: RawStatus) -> Result<Self, DriverError> {
        let task_state = TaskState::try_from(raw.task_state).map_err(|_| {
            DriverError::InvalidStatus(format!("unknown task state code {}", raw.task_state))
        })?;

        Ok(Self {
            position: SmallVec::from_vec(raw.position),
            homed: raw.homed.map(SmallVec::from_vec).unwrap_or_default(),
            axis_mask: raw.axis_mask.unwrap_or(0),
            task_state,
            interp_state: InterpState::from(raw.interp_state),
            current_velocity: raw.current_velocity,
            polled_at: Instant::now(),
        })
    }

    /// 已配置关节数量
    pub fn joint_count(&self) -> usize {
        joint_count_from_mask(self.axis_mask)
    }

    /// 前 `joints` 个关节是否全部回零
    ///
    /// 回零标志列表短于 `joints` 时视为未回零。
    pub fn homed_for(&self, joints: usize) -> bool {
        self.homed.len() >= joints && self.homed[..joints].iter().all(|&h| h)
    }

    /// 所有已配置关节是否全部回零
    pub fn is_homed(&self) -> bool {
        self.homed_for(self.joint_count())
    }

    /// 指定轴位置，超出范围时返回 0
    pub fn axis(&self, index: usize) -> f64 {
        self.position.get(index).copied().unwrap_or(0.0)
    }

    pub fn is_estopped(&self) -> bool {
        self.task_state.is_estop()
    }

    pub fn is_on(&self) -> bool {
        self.task_state.is_on()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(homed: Option<Vec<bool>>, axis_mask: Option<u32>) -> RawStatus {
        RawStatus {
            position: vec![1.0, 2.0, 3.0],
            homed,
            axis_mask,
            task_state: TaskState::On.as_u8(),
            interp_state: InterpState::Idle.code(),
            current_velocity: 0.0,
        }
    }

    #[test]
    fn test_joint_count_from_mask() {
        assert_eq!(joint_count_from_mask(0b111), 3);
        assert_eq!(joint_count_from_mask(0b1_0000_0111), 4);
        assert_eq!(joint_count_from_mask(0b1), 1);
        assert_eq!(joint_count_from_mask(0), DEFAULT_JOINT_COUNT);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let snapshot = MachineSnapshot::from_raw(raw(None, None)).unwrap();
        assert!(snapshot.homed.is_empty());
        assert_eq!(snapshot.axis_mask, 0);
        assert_eq!(snapshot.joint_count(), 3);
        // 列表缺失时按未回零处理
        assert!(!snapshot.is_homed());
    }

    #[test]
    fn test_homed_only_consults_configured_joints() {
        let mut flags = vec![true, true, true];
        flags.extend(std::iter::repeat_n(false, 13));
        let snapshot = MachineSnapshot::from_raw(raw(Some(flags), Some(0b111))).unwrap();
        assert!(snapshot.is_homed());
    }

    #[test]
    fn test_one_unhomed_joint_fails() {
        let snapshot =
            MachineSnapshot::from_raw(raw(Some(vec![true, false, true]), Some(0b111))).unwrap();
        assert!(!snapshot.is_homed());
    }

    #[test]
    fn test_short_flag_list_fails_closed() {
        let snapshot = MachineSnapshot::from_raw(raw(Some(vec![true, true]), Some(0b111))).unwrap();
        assert!(!snapshot.is_homed());
        assert!(snapshot.homed_for(2));
    }

    #[test]
    fn test_unknown_task_state_is_rejected() {
        let mut status = raw(None, None);
        status.task_state = 0;
        let err = MachineSnapshot::from_raw(status).unwrap_err();
        assert!(matches!(err, DriverError::InvalidStatus(_)));
    }

    #[test]
    fn test_axis_out_of_range() {
        let snapshot = MachineSnapshot::from_raw(raw(None, None)).unwrap();
        assert_eq!(snapshot.axis(2), 3.0);
        assert_eq!(snapshot.axis(3), 0.0);
    }
}
