//! 交互式校准
//!
//! 选择目标（min / center / max）→ 微调脉宽 → `set` 保存为该目标。

use crate::modes::repl::{LineReader, ReplEvent, run_isolated};
use crate::session::{GlobalArgs, Session};
use crate::validation::validate_pins;
use anyhow::Result;
use clap::Args;
use piservo_sdk::{CalibratedAxis, CalibrationTarget};

const HISTORY_FILE: &str = ".piservo_calib_history";

/// `+` / `-` 的默认步长（µs）
const JOG_STEP: i64 = 20;

#[derive(Args, Debug)]
pub struct CalibCommand {
    /// GPIO 引脚
    pub pin: u32,
}

/// 一行输入对应的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalibAction {
    Select(CalibrationTarget),
    Jog(i64),
    Pulse(u32),
    Set,
    Show,
    Help,
}

fn parse_action(line: &str) -> Result<CalibAction> {
    let line = line.trim();
    if let Ok(target) = line.parse::<CalibrationTarget>() {
        return Ok(CalibAction::Select(target));
    }
    let action = match line {
        "set" | "s" => CalibAction::Set,
        "show" | "?" => CalibAction::Show,
        "help" | "h" => CalibAction::Help,
        "+" => CalibAction::Jog(JOG_STEP),
        "-" => CalibAction::Jog(-JOG_STEP),
        _ if line.starts_with('+') || line.starts_with('-') => {
            CalibAction::Jog(line.parse().map_err(|_| anyhow::anyhow!("无效的步长: {}", line))?)
        },
        _ => CalibAction::Pulse(line.parse().map_err(|_| anyhow::anyhow!("未知命令: {}", line))?),
    };
    Ok(action)
}

impl CalibCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        validate_pins(&[self.pin])?;
        let session = Session::open(global)?;
        let mut axis = CalibratedAxis::new(self.pin, session.driver.clone(), session.store.clone());
        let mut target = CalibrationTarget::Center;
        axis.move_by_pulse(i64::from(axis.calibration_value(target)), true)?;

        let mut input = LineReader::new(HISTORY_FILE)?;
        println!("GPIO{} 校准：min/center/max 选择目标，+/- 微调 {}µs，+N/-N 任意步长，set 保存", self.pin, JOG_STEP);
        show(&axis, target)?;

        loop {
            let prompt = format!("calib[{}:{}]> ", self.pin, target);
            match input.read(&prompt) {
                ReplEvent::Line(line) => run_isolated(&line, || {
                    match parse_action(&line)? {
                        CalibAction::Select(t) => {
                            target = t;
                            axis.move_by_pulse(i64::from(axis.calibration_value(t)), true)?;
                        },
                        CalibAction::Jog(diff) => {
                            let cur = i64::from(axis.current_pulse()?);
                            axis.move_by_pulse(cur + diff, true)?;
                        },
                        CalibAction::Pulse(p) => axis.move_by_pulse(i64::from(p), true)?,
                        CalibAction::Set => {
                            let value = axis.set_calibration(target, None)?;
                            println!("✅ {} = {}", target, value);
                        },
                        CalibAction::Show => {},
                        CalibAction::Help => print_help(),
                    }
                    show(&axis, target)
                }),
                ReplEvent::Interrupt => println!("输入 'exit' 退出"),
                ReplEvent::Exit => break,
            }
        }

        axis.off()?;
        Ok(())
    }
}

fn show(axis: &CalibratedAxis, target: CalibrationTarget) -> Result<()> {
    let c = axis.calibration();
    println!(
        "  target={} pulse={}  [min={} center={} max={}]",
        target,
        axis.current_pulse()?,
        c.min,
        c.center,
        c.max
    );
    Ok(())
}

fn print_help() {
    println!("  min | center | max (n/c/x)  选择目标并移动到当前校准值");
    println!("  + | -                         微调 ±{}µs", JOG_STEP);
    println!("  +N | -N                       微调 ±Nµs");
    println!("  N                             移动到脉宽 N");
    println!("  set                           把当前脉宽存为目标值");
    println!("  show                          显示校准值");
    println!("  exit                          退出（断电）");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action("max").unwrap(), CalibAction::Select(CalibrationTarget::Max));
        assert_eq!(parse_action("n").unwrap(), CalibAction::Select(CalibrationTarget::Min));
        assert_eq!(parse_action("+").unwrap(), CalibAction::Jog(20));
        assert_eq!(parse_action("-").unwrap(), CalibAction::Jog(-20));
        assert_eq!(parse_action("+5").unwrap(), CalibAction::Jog(5));
        assert_eq!(parse_action("-100").unwrap(), CalibAction::Jog(-100));
        assert_eq!(parse_action("1200").unwrap(), CalibAction::Pulse(1200));
        assert_eq!(parse_action("set").unwrap(), CalibAction::Set);
        assert!(parse_action("+x").is_err());
        assert!(parse_action("jump").is_err());
    }
}
