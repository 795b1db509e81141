//! 意图执行器
//!
//! 把一个 [`MotionIntent`] 作用到共享的 [`MultiAxisController`] 上。
//! 工作线程与同步执行（[`DirectExecutor`](crate::sink::DirectExecutor)）共用这一实现。

use crate::error::ControlError;
use crate::intent::{MotionIntent, WorkerParam};
use parking_lot::Mutex;
use piservo_client::MultiAxisController;
use piservo_tools::AppConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 多线程共享的控制器
pub type SharedController = Arc<Mutex<MultiAxisController>>;

/// 工作参数：意图省略时长 / 步数 / 间隔时使用的默认值
///
/// 只由执行线程修改；对外通过快照发布。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkerState {
    pub move_sec: f64,
    pub step_n: u32,
    pub interval_sec: f64,
}

impl Default for WorkerState {
    fn default() -> Self {
        Self {
            move_sec: piservo_client::DEFAULT_MOVE_SEC,
            step_n: piservo_client::DEFAULT_STEP_N,
            interval_sec: 0.0,
        }
    }
}

impl From<&AppConfig> for WorkerState {
    fn from(config: &AppConfig) -> Self {
        Self {
            move_sec: config.move_sec,
            step_n: config.step_n,
            interval_sec: config.interval_sec,
        }
    }
}

impl WorkerState {
    /// 修改一个参数；非法取值（负数、非有限、步数 < 1）返回错误且不修改
    pub fn apply(&mut self, param: WorkerParam, value: f64) -> Result<(), ControlError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ControlError::MalformedIntent(format!("{} = {}", param, value)));
        }
        match param {
            WorkerParam::MoveSec => self.move_sec = value,
            WorkerParam::IntervalSec => self.interval_sec = value,
            WorkerParam::StepN => {
                let n = value.round();
                if n < 1.0 || n > u32::MAX as f64 {
                    return Err(ControlError::MalformedIntent(format!("{} = {}", param, value)));
                }
                self.step_n = n as u32;
            },
        }
        debug!("worker param {} = {}", param, value);
        Ok(())
    }
}

/// 阻塞休眠；非正数或非有限值不休眠
pub(crate) fn sleep_sec(sec: f64) {
    if sec.is_finite() && sec > 0.0 {
        spin_sleep::sleep(Duration::from_secs_f64(sec));
    }
}

/// 意图执行器
pub struct Executor {
    controller: SharedController,
    state: WorkerState,
}

impl Executor {
    pub fn new(controller: SharedController, state: WorkerState) -> Self {
        Self { controller, state }
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    /// 执行一个意图
    ///
    /// 移动类意图持锁完成整个插值过程；`Sleep` 与间隔休眠不持锁。
    pub fn execute(&mut self, intent: &MotionIntent) -> Result<(), ControlError> {
        debug!("execute: {:?}", intent);
        match intent {
            MotionIntent::SetAngles {
                targets,
                move_sec,
                step_n,
            } => {
                let (sec, n) = self.timing(*move_sec, *step_n);
                self.controller.lock().move_all_angles_sync(targets, sec, n)?;
            },
            MotionIntent::SetAnglesRelative {
                deltas,
                move_sec,
                step_n,
            } => {
                let (sec, n) = self.timing(*move_sec, *step_n);
                self.controller.lock().move_all_angles_sync_relative(deltas, sec, n)?;
            },
            MotionIntent::SetAnglesImmediate { targets } => {
                self.controller.lock().move_all_angles(targets)?;
            },
            MotionIntent::SetPulsesRelative { diffs } => {
                self.controller.lock().move_all_pulses_relative(diffs, true)?;
            },
            MotionIntent::SetParam { param, value } => {
                self.state.apply(*param, *value)?;
            },
            MotionIntent::Sleep { sec } => {
                if *sec <= 0.0 {
                    debug!("sleep {} sec: nothing to do", sec);
                }
                sleep_sec(*sec);
            },
            MotionIntent::SetCalibration { axis, target } => {
                let value = self.controller.lock().set_calibration(*axis, *target, None)?;
                debug!("axis {}: {} = {}", axis, target, value);
            },
            MotionIntent::Cancel => {
                debug!("cancel reached executor: no pending intents here");
            },
        }

        if intent.is_motion() {
            sleep_sec(self.state.interval_sec);
        }
        Ok(())
    }

    fn timing(&self, move_sec: Option<f64>, step_n: Option<u32>) -> (f64, u32) {
        let sec = match move_sec {
            Some(s) if s.is_finite() && s >= 0.0 => s,
            Some(s) => {
                warn!("invalid move_sec {}, using {}", s, self.state.move_sec);
                self.state.move_sec
            },
            None => self.state.move_sec,
        };
        (sec, step_n.unwrap_or(self.state.step_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piservo_client::{AngleTarget, CalibrationTarget};
    use piservo_driver::MockDriver;
    use piservo_tools::{CalibrationTriple, MemoryCalibrationStore};
    use std::time::Instant;

    fn setup() -> (Executor, Arc<MockDriver>, Arc<MemoryCalibrationStore>) {
        let drv = Arc::new(MockDriver::new());
        let store = Arc::new(MemoryCalibrationStore::new());
        let ctrl = MultiAxisController::builder(drv.clone(), store.clone())
            .channels([1, 2])
            .first_move(true)
            .build()
            .unwrap();
        drv.clear_writes();
        let state = WorkerState {
            move_sec: 0.0,
            step_n: 4,
            interval_sec: 0.0,
        };
        (Executor::new(Arc::new(Mutex::new(ctrl)), state), drv, store)
    }

    #[test]
    fn test_set_angles_uses_worker_defaults() {
        let (mut ex, drv, _) = setup();
        ex.execute(&MotionIntent::set_angles(vec![AngleTarget::Max, AngleTarget::Min]))
            .unwrap();
        assert_eq!(drv.writes_for(1).len(), 4);
        assert_eq!(drv.pulse(1), 2500);
        assert_eq!(drv.pulse(2), 500);
    }

    #[test]
    fn test_explicit_step_n_overrides() {
        let (mut ex, drv, _) = setup();
        ex.execute(&MotionIntent::SetAngles {
            targets: vec![AngleTarget::Angle(45.0), AngleTarget::Hold],
            move_sec: Some(0.0),
            step_n: Some(1),
        })
        .unwrap();
        assert_eq!(drv.writes_for(1), vec![2000]);
    }

    #[test]
    fn test_set_param_and_validation() {
        let (mut ex, _, _) = setup();
        ex.execute(&MotionIntent::SetParam {
            param: WorkerParam::StepN,
            value: 12.0,
        })
        .unwrap();
        ex.execute(&MotionIntent::SetParam {
            param: WorkerParam::IntervalSec,
            value: 0.05,
        })
        .unwrap();
        assert_eq!(ex.state().step_n, 12);
        assert_eq!(ex.state().interval_sec, 0.05);

        for (param, value) in [
            (WorkerParam::MoveSec, -1.0),
            (WorkerParam::StepN, 0.0),
            (WorkerParam::IntervalSec, f64::NAN),
        ] {
            let err = ex.execute(&MotionIntent::SetParam { param, value }).unwrap_err();
            assert!(matches!(err, ControlError::MalformedIntent(_)));
        }
        assert_eq!(ex.state().step_n, 12);
    }

    #[test]
    fn test_sleep_blocks_and_negative_is_noop() {
        let (mut ex, _, _) = setup();
        let start = Instant::now();
        ex.execute(&MotionIntent::Sleep { sec: 0.05 }).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(45));

        let start = Instant::now();
        ex.execute(&MotionIntent::Sleep { sec: -3.0 }).unwrap();
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn test_pulses_relative_is_forced() {
        let (mut ex, drv, _) = setup();
        ex.controller()
            .lock()
            .set_calibration(0, CalibrationTarget::Max, Some(1600))
            .unwrap();
        ex.execute(&MotionIntent::SetPulsesRelative {
            diffs: vec![Some(300), None],
        })
        .unwrap();
        assert_eq!(drv.pulse(1), 1800, "forced move ignores calibrated max");
        assert!(drv.writes_for(2).is_empty());
    }

    #[test]
    fn test_set_calibration_uses_current_pulse() {
        let (mut ex, _, store) = setup();
        ex.execute(&MotionIntent::SetPulsesRelative {
            diffs: vec![None, Some(-200)],
        })
        .unwrap();
        ex.execute(&MotionIntent::SetCalibration {
            axis: 1,
            target: CalibrationTarget::Center,
        })
        .unwrap();
        assert_eq!(store.get(2), Some(CalibrationTriple::new(500, 1300, 2500)));
    }

    #[test]
    fn test_argument_error_surfaces() {
        let (mut ex, drv, _) = setup();
        let err = ex
            .execute(&MotionIntent::set_angles(vec![AngleTarget::Angle(10.0)]))
            .unwrap_err();
        assert!(matches!(err, ControlError::Servo(_)));
        assert_eq!(drv.write_count(), 0);

        assert!(
            ex.execute(&MotionIntent::SetCalibration {
                axis: 7,
                target: CalibrationTarget::Min
            })
            .is_err()
        );
    }

    #[test]
    fn test_worker_state_from_config() {
        let config = AppConfig {
            move_sec: 1.5,
            step_n: 8,
            interval_sec: 0.25,
            ..Default::default()
        };
        let state = WorkerState::from(&config);
        assert_eq!(
            state,
            WorkerState {
                move_sec: 1.5,
                step_n: 8,
                interval_sec: 0.25
            }
        );
        assert_eq!(WorkerState::default().step_n, 40);
    }

    proptest::proptest! {
        #[test]
        fn prop_apply_keeps_step_n_valid(
            param in proptest::sample::select(vec![WorkerParam::MoveSec, WorkerParam::StepN, WorkerParam::IntervalSec]),
            value in proptest::num::f64::ANY,
        ) {
            let mut state = WorkerState::default();
            let before = state;
            match state.apply(param, value) {
                Ok(()) => proptest::prop_assert!(state.move_sec >= 0.0 && state.interval_sec >= 0.0),
                Err(_) => proptest::prop_assert_eq!(state, before),
            }
            proptest::prop_assert!(state.step_n >= 1);
        }
    }
}
