//! 命令定义和实现

pub mod config;
pub mod r#move;

use clap::{Subcommand, ValueEnum};
use cnc_sdk::{SessionError, SessionHandle};

use crate::output::Output;

pub use config::ConfigCommand;
pub use r#move::MoveCommand;

/// 电源状态
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

/// 机床命令（One-shot 和 REPL 共用）
#[derive(Subcommand, Debug)]
pub enum MachineCommand {
    /// 查询机床状态
    Status,

    /// 查询当前位置
    Position,

    /// 定位移动
    Move {
        #[command(flatten)]
        args: MoveCommand,
    },

    /// 所有关节回零
    Home {
        /// 下发后立即返回，不等待回零完成
        #[arg(long)]
        no_wait: bool,
    },

    /// 上电/断电
    Power {
        #[arg(value_enum)]
        state: PowerState,
    },

    /// 急停（--reset 复位）
    Estop {
        #[arg(long)]
        reset: bool,
    },
}

impl MachineCommand {
    /// 通过会话执行命令并输出结果
    pub fn execute(self, handle: &SessionHandle, out: &Output) -> Result<(), SessionError> {
        match self {
            MachineCommand::Status => out.status(&handle.status()?),

            MachineCommand::Position => out.position(&handle.position()?),

            MachineCommand::Move { args } => {
                let outcome = args.execute(handle)?;
                out.outcome(&outcome);
            },

            MachineCommand::Home { no_wait } => out.outcome(&handle.home(!no_wait)?),

            MachineCommand::Power { state } => {
                out.outcome(&handle.set_power(state == PowerState::On)?)
            },

            MachineCommand::Estop { reset } => {
                let outcome = if reset {
                    handle.reset_emergency_stop()?
                } else {
                    handle.emergency_stop()?
                };
                out.outcome(&outcome);
            },
        }
        Ok(())
    }
}
