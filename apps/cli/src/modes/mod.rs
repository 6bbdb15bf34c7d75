//! 运行模式

pub mod oneshot;
pub mod repl;

use anyhow::Result;
use cnc_sdk::{CncService, MockMachine, Session, Settings};
use tracing::info;

/// 打开模拟机床会话
pub fn open_session(settings: &Settings, homed: bool) -> Result<Session> {
    let machine = if homed { MockMachine::ready() } else { MockMachine::new() };
    info!(homed, "using simulated machine");

    let service = CncService::connect(machine, settings);
    Ok(Session::spawn(service)?)
}
