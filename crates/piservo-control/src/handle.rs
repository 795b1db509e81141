//! 异步舵机句柄
//!
//! 持有控制器与工作线程。所有方法都只是入队，不阻塞调用者；
//! [`ServoHandle::end`] 停止工作线程后给所有轴断电。

use crate::error::ControlError;
use crate::executor::{SharedController, WorkerState};
use crate::intent::{MotionIntent, WorkerParam};
use crate::metrics::MetricsSnapshot;
use crate::sink::{Dispatch, IntentSink};
use crate::worker::CommandQueueWorker;
use parking_lot::Mutex;
use piservo_client::{AngleTarget, MultiAxisController};
use std::sync::Arc;
use tracing::{debug, error};

/// 异步舵机句柄
pub struct ServoHandle {
    controller: SharedController,
    /// 构建后不变；缓存起来，读取时不与正在执行的移动争锁
    channels: Vec<u32>,
    worker: CommandQueueWorker,
    ended: bool,
}

impl ServoHandle {
    pub fn new(controller: MultiAxisController, state: WorkerState) -> Result<Self, ControlError> {
        let channels = controller.channels();
        let controller = Arc::new(Mutex::new(controller));
        let worker = CommandQueueWorker::spawn(controller.clone(), state)?;
        Ok(Self {
            controller,
            channels,
            worker,
            ended: false,
        })
    }

    pub fn axis_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> Vec<u32> {
        self.channels.clone()
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    pub fn worker(&self) -> &CommandQueueWorker {
        &self.worker
    }

    pub fn send(&self, intent: MotionIntent) -> Result<Dispatch, ControlError> {
        self.worker.enqueue(intent)
    }

    pub fn send_json(&self, json: &str) -> Result<Dispatch, ControlError> {
        self.worker.enqueue_json(json)
    }

    /// 丢弃排队中的意图（正在执行的不受影响）
    pub fn cancel(&self) -> usize {
        self.worker.cancel()
    }

    pub fn move_all_angles(&self, targets: Vec<AngleTarget>) -> Result<Dispatch, ControlError> {
        self.send(MotionIntent::SetAnglesImmediate { targets })
    }

    pub fn move_all_angles_sync(
        &self,
        targets: Vec<AngleTarget>,
        move_sec: Option<f64>,
        step_n: Option<u32>,
    ) -> Result<Dispatch, ControlError> {
        self.send(MotionIntent::SetAngles {
            targets,
            move_sec,
            step_n,
        })
    }

    pub fn move_all_angles_sync_relative(
        &self,
        deltas: Vec<f64>,
        move_sec: Option<f64>,
        step_n: Option<u32>,
    ) -> Result<Dispatch, ControlError> {
        self.send(MotionIntent::SetAnglesRelative {
            deltas,
            move_sec,
            step_n,
        })
    }

    pub fn set_move_sec(&self, sec: f64) -> Result<Dispatch, ControlError> {
        self.set_param(WorkerParam::MoveSec, sec)
    }

    pub fn set_step_n(&self, n: u32) -> Result<Dispatch, ControlError> {
        self.set_param(WorkerParam::StepN, n as f64)
    }

    pub fn set_interval(&self, sec: f64) -> Result<Dispatch, ControlError> {
        self.set_param(WorkerParam::IntervalSec, sec)
    }

    fn set_param(&self, param: WorkerParam, value: f64) -> Result<Dispatch, ControlError> {
        self.send(MotionIntent::SetParam { param, value })
    }

    pub fn params(&self) -> WorkerState {
        self.worker.params()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.worker.metrics()
    }

    /// 停止工作线程并给所有轴断电
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        debug!("Ending servo handle");
        self.worker.stop();
        if let Err(e) = self.controller.lock().off() {
            error!("Failed to power off servos: {}", e);
        }
    }
}

impl IntentSink for ServoHandle {
    fn submit(&mut self, intent: MotionIntent) -> Result<Dispatch, ControlError> {
        self.send(intent)
    }
}

impl Drop for ServoHandle {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piservo_driver::MockDriver;
    use piservo_tools::MemoryCalibrationStore;
    use std::time::{Duration, Instant};

    fn handle() -> (ServoHandle, Arc<MockDriver>) {
        let drv = Arc::new(MockDriver::new());
        let ctrl = MultiAxisController::builder(drv.clone(), Arc::new(MemoryCalibrationStore::new()))
            .channels([3, 4, 5])
            .first_move(true)
            .build()
            .unwrap();
        let state = WorkerState {
            move_sec: 0.0,
            step_n: 2,
            interval_sec: 0.0,
        };
        (ServoHandle::new(ctrl, state).unwrap(), drv)
    }

    #[test]
    fn test_end_stops_worker_then_powers_off() {
        let (mut h, drv) = handle();
        h.move_all_angles_sync(vec![AngleTarget::Max; 3], None, None).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while h.metrics().processed() < 1 {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(drv.pulse(3), 2500);

        h.end();
        assert!(!h.worker().is_running());
        assert_eq!(drv.pulse(3), 0);
        assert_eq!(drv.pulse(5), 0);
        assert!(h.send(MotionIntent::Sleep { sec: 0.0 }).is_err());
    }

    #[test]
    fn test_param_helpers_and_metadata() {
        let (h, _) = handle();
        assert_eq!(h.axis_count(), 3);
        assert_eq!(h.channels(), vec![3, 4, 5]);
        h.set_step_n(9).unwrap();
        h.set_interval(0.0).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while h.metrics().processed() < 2 {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(h.params().step_n, 9);
    }

    #[test]
    fn test_metadata_does_not_wait_for_running_move() {
        let (h, _) = handle();
        h.move_all_angles_sync(vec![AngleTarget::Max; 3], Some(1.0), Some(10)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        // 等待工作线程进入移动（持有控制器锁）
        while !h.controller().is_locked() {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(1));
        }

        let start = Instant::now();
        assert_eq!(h.axis_count(), 3);
        assert_eq!(h.channels(), vec![3, 4, 5]);
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
