//! # CNC CLI
//!
//! Command-line interface for CNC machine control.
//!
//! 内置的唯一后端是模拟机床；真实控制器通过实现 `MachineInterface` 接入。
//!
//! ## 双模式架构
//!
//! ### One-shot 模式（推荐用于 CI/脚本）
//!
//! ```bash
//! cnc-cli --json status
//! cnc-cli --homed move abs --x 10 --y 20 --feed 1500
//! ```
//!
//! ### REPL 模式（一个会话贯穿所有命令）
//!
//! ```bash
//! $ cnc-cli shell
//! cnc> home
//! cnc> move abs --x 10 --y 20
//! cnc> move rel --x -5 --rapid
//! cnc> estop
//! cnc> exit
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cnc_sdk::Settings;

mod commands;
mod modes;
mod output;

use commands::{ConfigCommand, MachineCommand};
use output::Output;

/// CNC CLI - 机床控制命令行工具
#[derive(Parser, Debug)]
#[command(name = "cnc-cli")]
#[command(about = "Command-line interface for CNC machine control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认为用户配置目录下的 cnc/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 以 JSON 输出结果
    #[arg(long, global = true)]
    json: bool,

    /// 模拟机床启动时已上电并回零
    #[arg(long, global = true)]
    homed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Machine(MachineCommand),

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 启动交互式 Shell（REPL 模式）
    Shell,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => commands::config::default_config_file()?,
    };
    let mut settings = Settings::load_or_default(&config_path)
        .with_context(|| format!("加载配置失败: {}", config_path.display()))?;
    settings.apply_env()?;
    settings.validate()?;

    // 初始化日志
    cnc_sdk::init_logging(&settings.log.level);

    let out = Output::new(cli.json);

    match cli.command {
        Commands::Machine(cmd) => {
            // One-shot 模式
            modes::oneshot::run(cmd, &settings, cli.homed, &out)
        },

        Commands::Config(cmd) => {
            cmd.execute(&settings, &config_path, &out)?;
            Ok(ExitCode::SUCCESS)
        },

        Commands::Shell => {
            // REPL 模式：交互式 Shell
            modes::repl::run_repl(&settings, cli.homed, &out)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
