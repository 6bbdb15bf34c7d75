//! REPL 模式（交互式 Shell）
//!
//! 一个会话贯穿整个 Shell 生命周期，模拟机床状态在命令之间保留。

use anyhow::Result;
use clap::{Parser, Subcommand};
use cnc_sdk::Settings;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::commands::MachineCommand;
use crate::output::Output;

/// REPL 单行命令
#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "cnc>")]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Subcommand, Debug)]
enum ReplCommand {
    #[command(flatten)]
    Machine(MachineCommand),

    /// 退出 Shell
    #[command(alias = "quit")]
    Exit,
}

pub fn run_repl(settings: &Settings, homed: bool, out: &Output) -> Result<()> {
    let session = super::open_session(settings, homed)?;
    let handle = session.handle();
    let mut editor = DefaultEditor::new()?;

    println!("CNC Shell（模拟机床）- 输入 help 查看命令，exit 退出");

    loop {
        match editor.readline("cnc> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                match ReplLine::try_parse_from(line.split_whitespace()) {
                    Ok(ReplLine {
                        command: ReplCommand::Exit,
                    }) => break,
                    Ok(ReplLine {
                        command: ReplCommand::Machine(cmd),
                    }) => {
                        if let Err(err) = cmd.execute(&handle, out) {
                            out.error(&err);
                        }
                    },
                    Err(err) => {
                        let _ = err.print();
                    },
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("⚠️  输入 exit 退出（急停请使用 estop 命令）");
            },
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    drop(handle);
    session.shutdown()?;
    println!("👋 再见");
    Ok(())
}
