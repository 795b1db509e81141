//! 单轴：通道 + 校准三元组
//!
//! 角度与脉宽之间是以 center 为折点的两段线性映射：
//!
//! ```text
//! deg >= 0: pulse = center + (max - center) / 90 * deg
//! deg <  0: pulse = center + (center - min) / 90 * deg
//! ```

use crate::error::ServoError;
use crate::types::{AngleTarget, CalibrationTarget};
use piservo_driver::{ANGLE_MAX, PULSE_MAX, PULSE_MIN, SharedDriver, clip_angle};
use piservo_tools::{CalibrationTriple, SharedStore};
use tracing::{debug, error, warn};

/// 已校准的舵机轴
pub struct CalibratedAxis {
    channel: u32,
    calibration: CalibrationTriple,
    driver: SharedDriver,
    store: SharedStore,
}

impl CalibratedAxis {
    /// 从存储加载校准；没有记录时使用默认值并立即保存
    pub fn new(channel: u32, driver: SharedDriver, store: SharedStore) -> Self {
        let calibration = match store.load(channel) {
            Some(c) => c,
            None => {
                let c = CalibrationTriple::default();
                warn!("No calibration for channel {}, saving defaults", channel);
                if let Err(e) = store.save(channel, c) {
                    error!("Failed to save calibration for channel {}: {}", channel, e);
                }
                c
            },
        };
        debug!("Axis created: channel={}, calibration={:?}", channel, calibration);
        Self {
            channel,
            calibration,
            driver,
            store,
        }
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    pub fn calibration(&self) -> CalibrationTriple {
        self.calibration
    }

    /// 角度 → 脉宽（角度先裁剪到 `[-90, 90]`）
    pub fn pulse_from_angle(&self, deg: f64) -> u32 {
        let c = &self.calibration;
        let deg = clip_angle(deg);
        let span = if deg >= 0.0 {
            c.max.saturating_sub(c.center) as f64
        } else {
            c.center.saturating_sub(c.min) as f64
        };
        (c.center as f64 + span / ANGLE_MAX * deg).round() as u32
    }

    /// 脉宽 → 角度，按 `pulse >= center` 选择分段
    ///
    /// 分段宽度为 0（例如 `center == max`）时返回 0。
    pub fn angle_from_pulse(&self, pulse: u32) -> f64 {
        let c = &self.calibration;
        let span = if pulse >= c.center {
            c.max.saturating_sub(c.center) as f64
        } else {
            c.center.saturating_sub(c.min) as f64
        };
        if span == 0.0 {
            return 0.0;
        }
        (pulse as f64 - c.center as f64) / span * ANGLE_MAX
    }

    /// 当前脉宽（0 = 断电）
    pub fn current_pulse(&self) -> Result<u32, ServoError> {
        Ok(self.driver.get_pulse(self.channel)?)
    }

    pub fn current_angle(&self) -> Result<f64, ServoError> {
        Ok(self.angle_from_pulse(self.current_pulse()?))
    }

    /// 符号 / 保持目标解析为数值角度（已裁剪）
    pub fn resolve_angle(&self, target: AngleTarget) -> Result<f64, ServoError> {
        match target.symbolic_angle() {
            Some(d) if d.is_finite() => {
                if !(-ANGLE_MAX..=ANGLE_MAX).contains(&d) {
                    warn!("channel {}: angle {} out of range, clipped", self.channel, d);
                }
                Ok(clip_angle(d))
            },
            Some(d) => {
                warn!("channel {}: non-finite angle {}, holding", self.channel, d);
                Ok(clip_angle(self.current_angle()?))
            },
            None => Ok(clip_angle(self.current_angle()?)),
        }
    }

    /// 移动到角度目标
    ///
    /// `Hold` 读取当前角度后重新写入同一位置（仍然产生一次写入）。
    pub fn move_angle(&self, target: AngleTarget) -> Result<(), ServoError> {
        let deg = self.resolve_angle(target)?;
        let pulse = self.pulse_from_angle(deg);
        debug!("channel {}: move_angle {} -> deg={}, pulse={}", self.channel, target, deg, pulse);
        self.move_by_pulse(pulse as i64, false)
    }

    pub fn move_angle_relative(&self, delta: f64) -> Result<(), ServoError> {
        let cur = self.current_angle()?;
        self.move_angle(AngleTarget::Angle(cur + delta))
    }

    /// 按脉宽移动
    ///
    /// 非 `forced` 时先裁剪到校准范围；无论如何都裁剪到绝对范围。
    pub fn move_by_pulse(&self, pulse: i64, forced: bool) -> Result<(), ServoError> {
        let mut p = pulse;
        if !forced {
            let (lo, hi) = (self.calibration.min as i64, self.calibration.max as i64);
            if p < lo || p > hi {
                warn!("channel {}: pulse {} clipped to [{}, {}]", self.channel, p, lo, hi);
                p = p.clamp(lo, hi);
            }
        }
        if p < PULSE_MIN as i64 || p > PULSE_MAX as i64 {
            warn!(
                "channel {}: pulse {} outside [{}, {}], clipped",
                self.channel, p, PULSE_MIN, PULSE_MAX
            );
            p = p.clamp(PULSE_MIN as i64, PULSE_MAX as i64);
        }
        self.driver.set_pulse(self.channel, p as u32)?;
        Ok(())
    }

    pub fn move_center(&self) -> Result<(), ServoError> {
        self.move_by_pulse(self.calibration.center as i64, false)
    }

    pub fn move_min(&self) -> Result<(), ServoError> {
        self.move_by_pulse(self.calibration.min as i64, false)
    }

    pub fn move_max(&self) -> Result<(), ServoError> {
        self.move_by_pulse(self.calibration.max as i64, false)
    }

    /// 断电
    pub fn off(&self) -> Result<(), ServoError> {
        debug!("channel {}: off", self.channel);
        Ok(self.driver.off(self.channel)?)
    }

    pub fn calibration_value(&self, target: CalibrationTarget) -> u32 {
        match target {
            CalibrationTarget::Min => self.calibration.min,
            CalibrationTarget::Center => self.calibration.center,
            CalibrationTarget::Max => self.calibration.max,
        }
    }

    /// 设置校准值并立即保存
    ///
    /// `pulse = None` 使用当前脉宽。返回实际存下的值（裁剪、排序之后）。
    pub fn set_calibration(
        &mut self,
        target: CalibrationTarget,
        pulse: Option<u32>,
    ) -> Result<u32, ServoError> {
        let pulse = match pulse {
            Some(p) => p,
            None => self.current_pulse()?,
        };
        self.calibration = match target {
            CalibrationTarget::Min => self.calibration.with_min(pulse),
            CalibrationTarget::Center => self.calibration.with_center(pulse),
            CalibrationTarget::Max => self.calibration.with_max(pulse),
        };
        debug!(
            "channel {}: set {} = {} -> {:?}",
            self.channel, target, pulse, self.calibration
        );
        self.persist();
        Ok(self.calibration_value(target))
    }

    pub fn set_min(&mut self, pulse: Option<u32>) -> Result<u32, ServoError> {
        self.set_calibration(CalibrationTarget::Min, pulse)
    }

    pub fn set_center(&mut self, pulse: Option<u32>) -> Result<u32, ServoError> {
        self.set_calibration(CalibrationTarget::Center, pulse)
    }

    pub fn set_max(&mut self, pulse: Option<u32>) -> Result<u32, ServoError> {
        self.set_calibration(CalibrationTarget::Max, pulse)
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(self.channel, self.calibration) {
            error!("Failed to save calibration for channel {}: {}", self.channel, e);
        }
    }
}

impl std::fmt::Debug for CalibratedAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalibratedAxis")
            .field("channel", &self.channel)
            .field("calibration", &self.calibration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piservo_driver::MockDriver;
    use piservo_tools::MemoryCalibrationStore;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn axis_with(triple: CalibrationTriple) -> (CalibratedAxis, Arc<MockDriver>, Arc<MemoryCalibrationStore>) {
        let drv = Arc::new(MockDriver::new());
        let store = Arc::new(MemoryCalibrationStore::new().with_entry(17, triple));
        let axis = CalibratedAxis::new(17, drv.clone(), store.clone());
        (axis, drv, store)
    }

    /// 收集日志输出
    #[derive(Clone, Default)]
    struct LogBuf(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_calibrated_range_clip_logs_warning() {
        let (axis, drv, _) = axis_with(CalibrationTriple::new(1000, 1500, 2000));
        let logs = LogBuf::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || axis.move_by_pulse(2200, false)).unwrap();

        assert_eq!(drv.pulse(17), 2000);
        let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("WARN"), "{}", out);
        assert!(out.contains("pulse 2200 clipped to [1000, 2000]"), "{}", out);
    }

    #[test]
    fn test_default_calibration_is_saved() {
        let drv = Arc::new(MockDriver::new());
        let store = Arc::new(MemoryCalibrationStore::new());
        let axis = CalibratedAxis::new(4, drv, store.clone());
        assert_eq!(axis.calibration(), CalibrationTriple::default());
        assert_eq!(store.get(4), Some(CalibrationTriple::default()));
    }

    #[test]
    fn test_move_angle_full_range_scenario() {
        let (axis, drv, _) = axis_with(CalibrationTriple::new(500, 1500, 2500));
        axis.move_angle(AngleTarget::Angle(45.0)).unwrap();
        assert_eq!(drv.pulse(17), 2000);
        axis.move_angle(AngleTarget::Angle(-45.0)).unwrap();
        assert_eq!(drv.pulse(17), 1000);
    }

    #[test]
    fn test_asymmetric_segments() {
        let (axis, _, _) = axis_with(CalibrationTriple::new(1000, 1400, 2200));
        assert_eq!(axis.pulse_from_angle(90.0), 2200);
        assert_eq!(axis.pulse_from_angle(-90.0), 1000);
        assert_eq!(axis.pulse_from_angle(45.0), 1800);
        assert_eq!(axis.pulse_from_angle(-45.0), 1200);
        assert_eq!(axis.angle_from_pulse(1200), -45.0);
        assert_eq!(axis.angle_from_pulse(1800), 45.0);
    }

    #[test]
    fn test_symbolic_and_clipped_targets() {
        let (axis, drv, _) = axis_with(CalibrationTriple::new(700, 1500, 2300));
        axis.move_angle(AngleTarget::Max).unwrap();
        assert_eq!(drv.pulse(17), 2300);
        axis.move_angle(AngleTarget::Min).unwrap();
        assert_eq!(drv.pulse(17), 700);
        axis.move_angle(AngleTarget::Angle(150.0)).unwrap();
        assert_eq!(drv.pulse(17), 2300);
        axis.move_angle(AngleTarget::Center).unwrap();
        assert_eq!(drv.pulse(17), 1500);
    }

    #[test]
    fn test_hold_rewrites_current_position() {
        let (axis, drv, _) = axis_with(CalibrationTriple::default());
        axis.move_angle(AngleTarget::Angle(30.0)).unwrap();
        drv.clear_writes();

        axis.move_angle(AngleTarget::Hold).unwrap();
        assert_eq!(drv.writes_for(17), vec![1833]);
    }

    #[test]
    fn test_move_by_pulse_clipping() {
        let (axis, drv, _) = axis_with(CalibrationTriple::new(1000, 1500, 2000));
        axis.move_by_pulse(2400, false).unwrap();
        assert_eq!(drv.pulse(17), 2000);

        axis.move_by_pulse(2400, true).unwrap();
        assert_eq!(drv.pulse(17), 2400, "forced skips calibrated clip");

        axis.move_by_pulse(3000, true).unwrap();
        assert_eq!(drv.pulse(17), 2500, "absolute clip always applies");

        axis.move_by_pulse(-50, true).unwrap();
        assert_eq!(drv.pulse(17), 500);
    }

    #[test]
    fn test_calibration_setters_persist_and_order() {
        let (mut axis, drv, store) = axis_with(CalibrationTriple::default());

        assert_eq!(axis.set_center(Some(1600)).unwrap(), 1600);
        assert_eq!(axis.set_min(Some(1700)).unwrap(), 1600);
        assert_eq!(axis.set_max(Some(3000)).unwrap(), 2500);

        axis.move_by_pulse(1550, true).unwrap();
        // 当前脉宽 1550 低于 min，center 被夹到 min
        assert_eq!(axis.set_center(None).unwrap(), 1600);

        assert_eq!(store.get(17), Some(CalibrationTriple::new(1600, 1600, 2500)));
        assert_eq!(store.save_count(), 4);
        assert!(axis.calibration().is_ordered());
        assert_eq!(drv.write_count(), 1);
    }

    #[test]
    fn test_hardware_error_propagates() {
        let (axis, drv, _) = axis_with(CalibrationTriple::default());
        drv.set_fail_writes(true);
        let err = axis.move_angle(AngleTarget::Angle(10.0)).unwrap_err();
        assert!(matches!(err, ServoError::Hardware(_)));
    }

    #[test]
    fn test_move_angle_relative_and_off() {
        let (axis, drv, _) = axis_with(CalibrationTriple::default());
        axis.move_angle(AngleTarget::Angle(10.0)).unwrap();
        axis.move_angle_relative(20.0).unwrap();
        assert_eq!(drv.pulse(17), 1833);
        axis.off().unwrap();
        assert_eq!(drv.pulse(17), 0);
    }

    fn any_triple() -> impl Strategy<Value = CalibrationTriple> {
        (500u32..=2500, 500u32..=2500, 500u32..=2500).prop_map(|(a, b, c)| {
            let mut v = [a, b, c];
            v.sort();
            CalibrationTriple::new(v[0], v[1], v[2])
        })
    }

    proptest! {
        #[test]
        fn prop_angle_roundtrip_within_rounding(t in any_triple(), deg in -90.0f64..=90.0) {
            let (axis, _, _) = axis_with(t);
            let back = axis.angle_from_pulse(axis.pulse_from_angle(deg));
            let span = if deg >= 0.0 { t.max - t.center } else { t.center - t.min };
            // 分段宽度为 0 时整段都映射到 center
            prop_assume!(span > 0);
            let unit = 90.0 / span as f64;
            prop_assert!((back - deg).abs() <= unit, "deg={} back={} unit={}", deg, back, unit);
        }

        #[test]
        fn prop_move_to_current_angle_keeps_pulse(t in any_triple(), pulse in 500u32..=2500) {
            let (axis, drv, _) = axis_with(t);
            let pulse = pulse.clamp(t.min, t.max);
            axis.move_by_pulse(pulse as i64, true).unwrap();
            let cur = axis.current_angle().unwrap();
            axis.move_angle(AngleTarget::Angle(cur)).unwrap();
            let after = drv.pulse(17) as i64;
            prop_assert!((after - pulse as i64).abs() <= 1, "pulse={} after={}", pulse, after);
        }
    }
}
