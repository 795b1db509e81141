//! 单舵机脉宽移动

use crate::session::{GlobalArgs, Session};
use crate::validation::{PulseArg, validate_pins};
use anyhow::Result;
use clap::Args;
use piservo_sdk::CalibratedAxis;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct ServoCommand {
    /// GPIO 引脚
    pub pin: u32,

    /// 脉宽（500..2500，0 = 断电）或 min/center/max
    pub pulse: PulseArg,

    /// 移动后保持的秒数（之后断电）
    #[arg(short, long, default_value_t = 1.0)]
    pub sec: f64,
}

impl ServoCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        validate_pins(&[self.pin])?;
        if !(self.sec.is_finite() && self.sec >= 0.0) {
            anyhow::bail!("--sec 必须 >= 0");
        }

        let session = Session::open(global)?;
        let axis = CalibratedAxis::new(self.pin, session.driver.clone(), session.store.clone());

        match self.pulse {
            PulseArg::Pulse(0) => axis.off()?,
            PulseArg::Pulse(p) => axis.move_by_pulse(i64::from(p), true)?,
            PulseArg::Calibrated(target) => {
                axis.move_by_pulse(i64::from(axis.calibration_value(target)), false)?
            },
        }
        println!(
            "GPIO{}: pulse={} angle={:.1}",
            self.pin,
            axis.current_pulse()?,
            axis.current_angle()?
        );

        std::thread::sleep(Duration::from_secs_f64(self.sec));
        axis.off()?;
        Ok(())
    }
}
