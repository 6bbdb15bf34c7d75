//! 模拟机床
//!
//! 用于测试和演示的内存机床，行为尽量贴近实时控制器：
//! - 上电后处于 E-stop，必须先复位才能上电
//! - 回零请求在若干次轮询后完成
//! - MDI 指令在若干次轮询内保持解释器忙碌，并按 G90/G91 更新位置
//!
//! 同时支持故障注入（轮询失败、错误队列、指令拒绝）和调用记录。

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::{ErrorKind, InterfaceError, InterpState, MachineInterface, MachineMode, RawStatus, TaskState};

/// 控制器位置缓冲区长度（固定 9 轴）
const POSITION_SLOTS: usize = 9;
/// 控制器回零标志缓冲区长度（固定 16 个关节）
const HOMED_SLOTS: usize = 16;

/// 记录的下发调用
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    State(TaskState),
    Mode(MachineMode),
    Mdi(String),
    Home(usize),
    WaitComplete,
}

/// 模拟机床内部状态
#[derive(Debug, Clone)]
struct MockState {
    task_state: TaskState,
    mode: MachineMode,
    interp_state: InterpState,
    position: [f64; POSITION_SLOTS],
    homed: Option<Vec<bool>>,
    axis_mask: Option<u32>,
    velocity: f64,
    /// G90（true）或 G91（false）
    absolute: bool,
    /// MDI 完成前需要的轮询次数
    mdi_busy_polls: u32,
    busy_remaining: u32,
    /// 单个关节回零需要的轮询次数
    home_polls: u32,
    pending_homes: Vec<(usize, u32)>,
    errors: VecDeque<(ErrorKind, String)>,
    fail_polls: u32,
    reject_mdi: Option<String>,
    refusals: Vec<(MockCall, String)>,
    disconnected: bool,
    polls: u64,
    calls: Vec<MockCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            task_state: TaskState::Estop,
            mode: MachineMode::Manual,
            interp_state: InterpState::Idle,
            position: [0.0; POSITION_SLOTS],
            homed: Some(vec![false; HOMED_SLOTS]),
            axis_mask: Some(0b111),
            velocity: 0.0,
            absolute: true,
            mdi_busy_polls: 1,
            busy_remaining: 0,
            home_polls: 1,
            pending_homes: Vec::new(),
            errors: VecDeque::new(),
            fail_polls: 0,
            reject_mdi: None,
            refusals: Vec::new(),
            disconnected: false,
            polls: 0,
            calls: Vec::new(),
        }
    }
}

impl MockState {
    fn push_error(&mut self, kind: ErrorKind, text: impl Into<String>) {
        self.errors.push_back((kind, text.into()));
    }

    /// 推进一个轮询周期的模拟
    fn tick(&mut self) {
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            if self.busy_remaining == 0 {
                self.interp_state = InterpState::Idle;
                self.velocity = 0.0;
            }
        }

        let mut completed = Vec::new();
        self.pending_homes.retain_mut(|(joint, remaining)| {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                completed.push(*joint);
                false
            } else {
                true
            }
        });
        if let Some(homed) = self.homed.as_mut() {
            for joint in completed {
                if joint < homed.len() {
                    homed[joint] = true;
                }
            }
        }
    }

    /// 解析并执行一行 MDI 指令（只识别 G0/G1/G21/G90/G91 和 X/Y/Z/F 字）
    fn apply_mdi(&mut self, command: &str) -> Result<(), String> {
        let mut absolute = self.absolute;
        let mut targets: [Option<f64>; 3] = [None; 3];

        for word in command.split_whitespace() {
            let mut chars = word.chars();
            let letter = chars.next().map(|c| c.to_ascii_uppercase());
            let value = chars.as_str();

            match letter {
                Some('G') => match value {
                    "90" => absolute = true,
                    "91" => absolute = false,
                    "0" | "1" | "21" => {},
                    other => return Err(format!("Unsupported G-code G{}", other)),
                },
                Some(axis @ ('X' | 'Y' | 'Z' | 'F')) => {
                    let parsed: f64 = value
                        .parse()
                        .map_err(|_| format!("Bad number format in word '{}'", word))?;
                    match axis {
                        'X' => targets[0] = Some(parsed),
                        'Y' => targets[1] = Some(parsed),
                        'Z' => targets[2] = Some(parsed),
                        _ => {},
                    }
                },
                _ => return Err(format!("Unknown word '{}'", word)),
            }
        }

        self.absolute = absolute;
        for (axis, target) in targets.iter().enumerate() {
            if let Some(value) = target {
                if absolute {
                    self.position[axis] = *value;
                } else {
                    self.position[axis] += *value;
                }
            }
        }
        Ok(())
    }

    /// 记录一次下发；命中拒绝规则时返回 `Rejected`
    fn record(&mut self, call: MockCall) -> Result<(), InterfaceError> {
        let refusal = self
            .refusals
            .iter()
            .find(|(pattern, _)| match (pattern, &call) {
                (MockCall::Mdi(_), MockCall::Mdi(_)) => true,
                (pattern, call) => pattern == call,
            })
            .map(|(_, text)| text.clone());

        self.calls.push(call);
        match refusal {
            Some(text) => Err(InterfaceError::Rejected(text)),
            None => Ok(()),
        }
    }

    fn check_connected(&self) -> Result<(), InterfaceError> {
        if self.disconnected {
            Err(InterfaceError::Disconnected)
        } else {
            Ok(())
        }
    }
}

/// 模拟机床句柄
///
/// 克隆后共享同一份内部状态，测试可以在把一个句柄交给驱动层之后，
/// 继续用另一个句柄注入故障或检查调用记录。
#[derive(Debug, Clone, Default)]
pub struct MockMachine {
    inner: Arc<Mutex<MockState>>,
}

impl MockMachine {
    /// 创建处于 E-stop、未回零状态的 3 轴机床
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建已上电、3 个关节均已回零的机床
    pub fn ready() -> Self {
        let machine = Self::new();
        {
            let mut state = machine.inner.lock();
            state.task_state = TaskState::On;
            if let Some(homed) = state.homed.as_mut() {
                homed[..3].iter_mut().for_each(|h| *h = true);
            }
        }
        machine
    }

    pub fn set_task_state(&self, task_state: TaskState) {
        self.inner.lock().task_state = task_state;
    }

    pub fn task_state(&self) -> TaskState {
        self.inner.lock().task_state
    }

    pub fn mode(&self) -> MachineMode {
        self.inner.lock().mode
    }

    /// 设置轴掩码，`None` 表示控制器不报告该字段
    pub fn set_axis_mask(&self, mask: Option<u32>) {
        self.inner.lock().axis_mask = mask;
    }

    /// 替换整个回零标志列表，`None` 表示控制器不报告该字段
    pub fn set_homed(&self, homed: Option<Vec<bool>>) {
        self.inner.lock().homed = homed;
    }

    pub fn homed(&self) -> Option<Vec<bool>> {
        self.inner.lock().homed.clone()
    }

    pub fn set_interp_state(&self, interp_state: InterpState) {
        self.inner.lock().interp_state = interp_state;
    }

    pub fn set_velocity(&self, velocity: f64) {
        self.inner.lock().velocity = velocity;
    }

    /// 前三轴位置
    pub fn position(&self) -> [f64; 3] {
        let state = self.inner.lock();
        [state.position[0], state.position[1], state.position[2]]
    }

    pub fn set_position(&self, axis: usize, value: f64) {
        self.inner.lock().position[axis] = value;
    }

    /// 之后的 `n` 次轮询返回 IO 错误
    pub fn fail_next_polls(&self, n: u32) {
        self.inner.lock().fail_polls = n;
    }

    /// 向错误队列追加一条消息
    pub fn push_error(&self, kind: ErrorKind, text: impl Into<String>) {
        self.inner.lock().push_error(kind, text);
    }

    pub fn pending_errors(&self) -> usize {
        self.inner.lock().errors.len()
    }

    /// 之后所有 MDI 指令都以给定文本报错（不改变位置）
    pub fn reject_mdi(&self, text: impl Into<String>) {
        self.inner.lock().reject_mdi = Some(text.into());
    }

    /// 之后与 `call` 匹配的下发直接返回 `InterfaceError::Rejected(text)`
    ///
    /// `MockCall::Mdi` 匹配任意 MDI 文本。被拒绝的调用仍会记录，但不改变机床状态。
    pub fn refuse(&self, call: MockCall, text: impl Into<String>) {
        self.inner.lock().refusals.push((call, text.into()));
    }

    pub fn set_mdi_busy_polls(&self, polls: u32) {
        self.inner.lock().mdi_busy_polls = polls;
    }

    pub fn set_home_polls(&self, polls: u32) {
        self.inner.lock().home_polls = polls.max(1);
    }

    /// 模拟会话断开，之后所有调用返回 `Disconnected`
    pub fn disconnect(&self) {
        self.inner.lock().disconnected = true;
    }

    /// 累计轮询次数（包括失败的轮询）
    pub fn poll_count(&self) -> u64 {
        self.inner.lock().polls
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// 记录中的 MDI 指令文本
    pub fn mdi_commands(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Mdi(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl MachineInterface for MockMachine {
    fn poll_status(&mut self) -> Result<RawStatus, InterfaceError> {
        let mut state = self.inner.lock();
        state.check_connected()?;
        state.polls += 1;

        if state.fail_polls > 0 {
            state.fail_polls -= 1;
            return Err(InterfaceError::Io(std::io::Error::other(
                "status channel unavailable",
            )));
        }

        state.tick();

        Ok(RawStatus {
            position: state.position.to_vec(),
            homed: state.homed.clone(),
            axis_mask: state.axis_mask,
            task_state: state.task_state.as_u8(),
            interp_state: state.interp_state.code(),
            current_velocity: state.velocity,
        })
    }

    fn pop_next_error(&mut self) -> Result<Option<(ErrorKind, String)>, InterfaceError> {
        let mut state = self.inner.lock();
        state.check_connected()?;
        Ok(state.errors.pop_front())
    }

    fn dispatch_state(&mut self, target: TaskState) -> Result<(), InterfaceError> {
        let mut state = self.inner.lock();
        state.check_connected()?;
        state.record(MockCall::State(target))?;
        trace!(%target, current = %state.task_state, "mock state transition");

        match target {
            TaskState::Estop => {
                state.task_state = TaskState::Estop;
                state.busy_remaining = 0;
                state.interp_state = InterpState::Idle;
                state.pending_homes.clear();
            },
            TaskState::EstopReset => {
                if state.task_state == TaskState::Estop {
                    state.task_state = TaskState::EstopReset;
                }
            },
            TaskState::On => {
                if state.task_state == TaskState::Estop {
                    state.push_error(ErrorKind::OperatorError, "Cannot turn machine on while in E-stop");
                } else {
                    state.task_state = TaskState::On;
                }
            },
            TaskState::Off => {
                if state.task_state != TaskState::Estop {
                    state.task_state = TaskState::Off;
                }
            },
        }
        Ok(())
    }

    fn dispatch_mode(&mut self, mode: MachineMode) -> Result<(), InterfaceError> {
        let mut state = self.inner.lock();
        state.check_connected()?;
        state.record(MockCall::Mode(mode))?;
        state.mode = mode;
        Ok(())
    }

    fn dispatch_mdi(&mut self, command: &str) -> Result<(), InterfaceError> {
        let mut state = self.inner.lock();
        state.check_connected()?;
        state.record(MockCall::Mdi(command.to_string()))?;

        if state.task_state != TaskState::On || state.mode != MachineMode::Mdi {
            state.push_error(ErrorKind::OperatorError, "MDI requires machine on and in MDI mode");
            return Ok(());
        }

        if let Some(text) = state.reject_mdi.clone() {
            state.push_error(ErrorKind::OperatorError, text);
            return Ok(());
        }

        match state.apply_mdi(command) {
            Ok(()) => {
                state.interp_state = InterpState::Reading;
                state.busy_remaining = state.mdi_busy_polls;
                if state.busy_remaining == 0 {
                    state.interp_state = InterpState::Idle;
                }
            },
            Err(text) => state.push_error(ErrorKind::OperatorError, text),
        }
        Ok(())
    }

    fn dispatch_home(&mut self, joint: usize) -> Result<(), InterfaceError> {
        let mut state = self.inner.lock();
        state.check_connected()?;
        state.record(MockCall::Home(joint))?;

        if state.task_state != TaskState::On {
            state.push_error(ErrorKind::OperatorError, "Cannot home while machine is off");
            return Ok(());
        }

        if let Some(homed) = state.homed.as_mut()
            && joint < homed.len()
        {
            homed[joint] = false;
        }
        let polls = state.home_polls;
        state.pending_homes.push((joint, polls));
        Ok(())
    }

    fn wait_complete(&mut self) -> Result<(), InterfaceError> {
        let mut state = self.inner.lock();
        state.check_connected()?;
        state.calls.push(MockCall::WaitComplete);
        Ok(())
    }
}
