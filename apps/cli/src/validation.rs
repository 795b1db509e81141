//! 输入验证模块

use anyhow::Result;
use piservo_sdk::driver::{PULSE_MAX, PULSE_MIN, PULSE_OFF};
use piservo_sdk::CalibrationTarget;
use std::str::FromStr;

/// pigpio 可输出舵机脉宽的最大 GPIO 编号
pub const MAX_GPIO: u32 = 31;

/// 引脚列表：非空、不重复、在 GPIO 范围内
pub fn validate_pins(pins: &[u32]) -> Result<()> {
    if pins.is_empty() {
        anyhow::bail!("未指定引脚（命令行或配置文件 pins）");
    }
    for (i, pin) in pins.iter().enumerate() {
        if *pin > MAX_GPIO {
            anyhow::bail!("GPIO{} 超出范围 [0, {}]", pin, MAX_GPIO);
        }
        if pins[..i].contains(pin) {
            anyhow::bail!("GPIO{} 重复", pin);
        }
    }
    Ok(())
}

/// `servo` 子命令的脉宽参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseArg {
    /// 绝对脉宽（0 = 断电）
    Pulse(u32),
    /// 该引脚的校准值
    Calibrated(CalibrationTarget),
}

impl FromStr for PulseArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(target) = s.parse::<CalibrationTarget>() {
            return Ok(PulseArg::Calibrated(target));
        }
        let pulse: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}': 需要脉宽或 min/center/max", s))?;
        if pulse != PULSE_OFF && !(PULSE_MIN..=PULSE_MAX).contains(&pulse) {
            return Err(format!(
                "脉宽 {} 超出范围 [{}, {}]（0 = 断电）",
                pulse, PULSE_MIN, PULSE_MAX
            ));
        }
        Ok(PulseArg::Pulse(pulse))
    }
}
