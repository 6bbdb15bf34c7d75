//! 结果输出（文本或 JSON）

use cnc_sdk::{ErrorReport, MachineStatus, OperationOutcome, Position, SessionError};
use serde::Serialize;

/// 输出格式
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// 以 JSON 打印到 stdout
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("❌ JSON 编码失败: {}", e),
        }
    }

    pub fn outcome(&self, outcome: &OperationOutcome) {
        if self.json {
            return self.json(outcome);
        }
        println!("✅ {}", outcome.message);
        if let Some(ref command) = outcome.command {
            println!("   G-code: {}", command);
        }
        if let Some(active) = outcome.estop_active {
            println!("   E-stop: {}", if active { "ACTIVE" } else { "clear" });
        }
        if let Some(on) = outcome.machine_on {
            println!("   Power:  {}", if on { "ON" } else { "OFF" });
        }
    }

    pub fn position(&self, position: &Position) {
        if self.json {
            return self.json(position);
        }
        println!(
            "X: {:>10.4}  Y: {:>10.4}  Z: {:>10.4}  A: {:>10.4}",
            position.x, position.y, position.z, position.a
        );
    }

    pub fn status(&self, status: &MachineStatus) {
        if self.json {
            return self.json(status);
        }
        let homed: Vec<&str> = status.homed.iter().map(|&h| if h { "✓" } else { "·" }).collect();

        println!("机床状态:");
        println!("  上电:       {}", if status.machine_on { "ON" } else { "OFF" });
        println!("  急停:       {}", if status.estop_active { "⚠️  ACTIVE" } else { "clear" });
        println!("  回零:       [{}]", homed.join(" "));
        println!("  解释器状态: {}", status.interp_state);
        println!("  进给速度:   {:.1} mm/min", status.feed_rate);
        self.position(&status.position);
    }

    /// 打印错误（JSON 模式下输出 ErrorReport 到 stdout）
    pub fn error(&self, err: &SessionError) {
        if self.json {
            let report = match err {
                SessionError::Machine(machine) => ErrorReport::from(machine),
                other => ErrorReport {
                    error: true,
                    error_code: other.code().to_string(),
                    message: other.to_string(),
                    details: None,
                },
            };
            return self.json(&report);
        }
        eprintln!("❌ [{}] {}", err.code(), err);
    }
}
