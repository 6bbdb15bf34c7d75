//! One-shot 模式
//!
//! 每次调用：打开会话 -> 执行一条命令 -> 关闭会话

use std::process::ExitCode;

use anyhow::Result;
use cnc_sdk::Settings;

use crate::commands::MachineCommand;
use crate::output::Output;

pub fn run(command: MachineCommand, settings: &Settings, homed: bool, out: &Output) -> Result<ExitCode> {
    let session = super::open_session(settings, homed)?;
    let result = command.execute(&session.handle(), out);
    session.shutdown()?;

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            out.error(&err);
            Ok(ExitCode::FAILURE)
        },
    }
}
