//! 配置管理命令

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::Subcommand;
use cnc_sdk::Settings;

use crate::output::Output;

/// 默认配置文件路径
///
/// - Linux: `~/.config/cnc/config.toml`
/// - macOS: `~/Library/Application Support/cnc/config.toml`
/// - Windows: `%APPDATA%\cnc\config.toml`
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow!("无法确定配置目录"))?;
    path.push("cnc");
    path.push("config.toml");
    Ok(path)
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效配置（文件 + 环境变量覆盖）
    Show,

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(&self, settings: &Settings, path: &Path, out: &Output) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                if out.is_json() {
                    out.json(settings);
                } else {
                    print!("{}", settings.to_toml_string()?);
                }
            },

            ConfigCommand::Path => {
                let exists = path.exists();
                if out.is_json() {
                    out.json(&serde_json::json!({
                        "path": path.display().to_string(),
                        "exists": exists,
                    }));
                } else {
                    println!("{}", path.display());
                    if !exists {
                        println!("(文件不存在，使用默认配置)");
                    }
                }
            },
        }
        Ok(())
    }
}
