//! 多轴控制器
//!
//! 有序、按下标寻址的一组 [`CalibratedAxis`]。批量调用在任何写入之前校验
//! 列表长度，长度不符时返回 `ServoError::Argument` 且不产生写入。

use crate::axis::CalibratedAxis;
use crate::error::ServoError;
use crate::types::{AngleTarget, CalibrationTarget};
use piservo_driver::SharedDriver;
use piservo_tools::{CalibrationTriple, SharedStore};
use std::time::Duration;
use tracing::{debug, error, info, trace};

pub use piservo_tools::config::{DEFAULT_MOVE_SEC, DEFAULT_STEP_N};

/// 多轴控制器
#[derive(Debug)]
pub struct MultiAxisController {
    axes: Vec<CalibratedAxis>,
}

impl MultiAxisController {
    /// 由通道列表创建（不做初始移动）
    pub fn new(channels: &[u32], driver: SharedDriver, store: SharedStore) -> Self {
        let axes = channels
            .iter()
            .map(|&ch| CalibratedAxis::new(ch, driver.clone(), store.clone()))
            .collect();
        Self::from_axes(axes)
    }

    pub fn from_axes(axes: Vec<CalibratedAxis>) -> Self {
        debug!(
            "MultiAxisController: channels={:?}",
            axes.iter().map(|a| a.channel()).collect::<Vec<_>>()
        );
        Self { axes }
    }

    pub fn builder(driver: SharedDriver, store: SharedStore) -> ControllerBuilder {
        ControllerBuilder::new(driver, store)
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn channels(&self) -> Vec<u32> {
        self.axes.iter().map(|a| a.channel()).collect()
    }

    pub fn axes(&self) -> &[CalibratedAxis] {
        &self.axes
    }

    pub fn axis(&self, index: usize) -> Result<&CalibratedAxis, ServoError> {
        let count = self.axes.len();
        self.axes.get(index).ok_or(ServoError::AxisIndex { index, count })
    }

    pub fn axis_mut(&mut self, index: usize) -> Result<&mut CalibratedAxis, ServoError> {
        let count = self.axes.len();
        self.axes.get_mut(index).ok_or(ServoError::AxisIndex { index, count })
    }

    fn check_len(&self, what: &str, len: usize) -> Result<(), ServoError> {
        if len != self.axes.len() {
            error!("{}: length {} != axis count {}", what, len, self.axes.len());
            return Err(ServoError::length_mismatch(what, self.axes.len(), len));
        }
        Ok(())
    }

    /// 对每个轴执行同一操作，按轴序收集结果（第一个错误中止）
    pub fn for_each_axis<T, F>(&mut self, mut f: F) -> Result<Vec<T>, ServoError>
    where
        F: FnMut(&mut CalibratedAxis) -> Result<T, ServoError>,
    {
        self.axes.iter_mut().map(&mut f).collect()
    }

    // ---------------------------------------------------------------
    // 读取
    // ---------------------------------------------------------------

    pub fn get_pulse(&self, index: usize) -> Result<u32, ServoError> {
        self.axis(index)?.current_pulse()
    }

    pub fn get_all_pulses(&self) -> Result<Vec<u32>, ServoError> {
        self.axes.iter().map(|a| a.current_pulse()).collect()
    }

    pub fn get_all_angles(&self) -> Result<Vec<f64>, ServoError> {
        self.axes.iter().map(|a| a.current_angle()).collect()
    }

    // ---------------------------------------------------------------
    // 角度移动
    // ---------------------------------------------------------------

    /// 逐轴 `move_angle`，无插值
    pub fn move_all_angles(&self, targets: &[AngleTarget]) -> Result<(), ServoError> {
        self.check_len("move_all_angles", targets.len())?;
        for (axis, target) in self.axes.iter().zip(targets) {
            axis.move_angle(*target)?;
        }
        Ok(())
    }

    pub fn move_all_angles_relative(&self, deltas: &[f64]) -> Result<(), ServoError> {
        self.check_len("move_all_angles_relative", deltas.len())?;
        let targets = self.relative_targets(deltas)?;
        self.move_all_angles(&targets)
    }

    /// 同步插值移动
    ///
    /// 每一步每个轴都前进自己行程的 `1/step_n`，因此行程不同的轴同时到达。
    /// `step_n <= 1` 时退化为 [`move_all_angles`](Self::move_all_angles)。
    /// 最后一步直接写入解析后的目标，保证终点脉宽与 `pulse_from_angle(target)` 一致。
    pub fn move_all_angles_sync(
        &self,
        targets: &[AngleTarget],
        move_sec: f64,
        step_n: u32,
    ) -> Result<(), ServoError> {
        self.check_len("move_all_angles_sync", targets.len())?;
        debug!("move_all_angles_sync: targets={:?}, move_sec={}, step_n={}", targets, move_sec, step_n);

        if step_n <= 1 {
            return self.move_all_angles(targets);
        }

        let start = self.get_all_angles()?;
        let resolved = self.resolve_targets(targets, &start);
        let deltas: Vec<f64> = resolved.iter().zip(&start).map(|(t, s)| t - s).collect();
        let step_sleep = step_duration(move_sec, step_n);
        trace!("start={:?}, resolved={:?}, step_sleep={:?}", start, resolved, step_sleep);

        let mut next = vec![AngleTarget::Hold; self.axes.len()];
        for i in 1..=step_n {
            for (j, slot) in next.iter_mut().enumerate() {
                let deg = if i == step_n {
                    resolved[j]
                } else {
                    start[j] + deltas[j] * i as f64 / step_n as f64
                };
                *slot = AngleTarget::Angle(deg);
            }
            self.move_all_angles(&next)?;
            if !step_sleep.is_zero() {
                spin_sleep::sleep(step_sleep);
            }
        }
        Ok(())
    }

    pub fn move_all_angles_sync_relative(
        &self,
        deltas: &[f64],
        move_sec: f64,
        step_n: u32,
    ) -> Result<(), ServoError> {
        self.check_len("move_all_angles_sync_relative", deltas.len())?;
        let targets = self.relative_targets(deltas)?;
        self.move_all_angles_sync(&targets, move_sec, step_n)
    }

    /// 目标解析：符号目标取常量角度，`Hold` 取起点角度，数值裁剪到 `[-90, 90]`
    fn resolve_targets(&self, targets: &[AngleTarget], start: &[f64]) -> Vec<f64> {
        targets
            .iter()
            .zip(start)
            .map(|(t, s)| match t.symbolic_angle() {
                Some(d) if d.is_finite() => piservo_driver::clip_angle(d),
                _ => piservo_driver::clip_angle(*s),
            })
            .collect()
    }

    fn relative_targets(&self, deltas: &[f64]) -> Result<Vec<AngleTarget>, ServoError> {
        let cur = self.get_all_angles()?;
        Ok(cur.iter().zip(deltas).map(|(c, d)| AngleTarget::Angle(c + d)).collect())
    }

    // ---------------------------------------------------------------
    // 脉宽移动
    // ---------------------------------------------------------------

    pub fn move_pulse(&self, index: usize, pulse: i64, forced: bool) -> Result<(), ServoError> {
        self.axis(index)?.move_by_pulse(pulse, forced)
    }

    /// `None` 的轴不动（不写入）
    pub fn move_all_pulses(&self, pulses: &[Option<i64>], forced: bool) -> Result<(), ServoError> {
        self.check_len("move_all_pulses", pulses.len())?;
        for (axis, pulse) in self.axes.iter().zip(pulses) {
            if let Some(p) = pulse {
                axis.move_by_pulse(*p, forced)?;
            }
        }
        Ok(())
    }

    pub fn move_pulse_relative(&self, index: usize, diff: i64, forced: bool) -> Result<(), ServoError> {
        let axis = self.axis(index)?;
        let cur = axis.current_pulse()? as i64;
        trace!("move_pulse_relative: index={}, {} + {}", index, cur, diff);
        axis.move_by_pulse(cur + diff, forced)
    }

    /// `None` 的轴不动
    pub fn move_all_pulses_relative(&self, diffs: &[Option<i32>], forced: bool) -> Result<(), ServoError> {
        self.check_len("move_all_pulses_relative", diffs.len())?;
        let cur = self.get_all_pulses()?;
        let pulses: Vec<Option<i64>> = cur
            .iter()
            .zip(diffs)
            .map(|(c, d)| d.map(|d| *c as i64 + d as i64))
            .collect();
        self.move_all_pulses(&pulses, forced)
    }

    /// 所有轴断电（逐轴尝试，返回第一个错误）
    pub fn off(&self) -> Result<(), ServoError> {
        let mut first_err = None;
        for axis in &self.axes {
            if let Err(e) = axis.off() {
                error!("Failed to power off channel {}: {}", axis.channel(), e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    // ---------------------------------------------------------------
    // 校准
    // ---------------------------------------------------------------

    pub fn calibration(&self, index: usize) -> Result<CalibrationTriple, ServoError> {
        Ok(self.axis(index)?.calibration())
    }

    /// 设置第 `index` 轴的校准值（`None` = 当前脉宽），立即保存
    pub fn set_calibration(
        &mut self,
        index: usize,
        target: CalibrationTarget,
        pulse: Option<u32>,
    ) -> Result<u32, ServoError> {
        self.axis_mut(index)?.set_calibration(target, pulse)
    }
}

/// 每步休眠时长；非有限或负数按 0 处理
fn step_duration(move_sec: f64, step_n: u32) -> Duration {
    let sec = move_sec / step_n.max(1) as f64;
    if sec.is_finite() && sec > 0.0 {
        Duration::from_secs_f64(sec)
    } else {
        Duration::ZERO
    }
}

/// `MultiAxisController` 构造器
///
/// ```no_run
/// use std::sync::Arc;
/// use piservo_client::MultiAxisController;
/// use piservo_driver::MockDriver;
/// use piservo_tools::MemoryCalibrationStore;
///
/// let ctrl = MultiAxisController::builder(
///     Arc::new(MockDriver::new()),
///     Arc::new(MemoryCalibrationStore::new()),
/// )
/// .channels([17, 27, 22, 25])
/// .first_move(true)
/// .build()
/// .unwrap();
/// ```
pub struct ControllerBuilder {
    driver: SharedDriver,
    store: SharedStore,
    channels: Vec<u32>,
    first_move: bool,
}

impl ControllerBuilder {
    pub fn new(driver: SharedDriver, store: SharedStore) -> Self {
        Self {
            driver,
            store,
            channels: Vec::new(),
            first_move: false,
        }
    }

    pub fn channels(mut self, channels: impl IntoIterator<Item = u32>) -> Self {
        self.channels = channels.into_iter().collect();
        self
    }

    /// 构造后把所有轴移到 0 度
    pub fn first_move(mut self, enabled: bool) -> Self {
        self.first_move = enabled;
        self
    }

    pub fn build(self) -> Result<MultiAxisController, ServoError> {
        if self.channels.is_empty() {
            return Err(ServoError::Argument("no channels given".to_string()));
        }
        let ctrl = MultiAxisController::new(&self.channels, self.driver, self.store);
        if self.first_move {
            info!("First move: all axes to center");
            ctrl.move_all_angles(&vec![AngleTarget::Angle(0.0); ctrl.axis_count()])?;
        }
        Ok(ctrl)
    }
}
