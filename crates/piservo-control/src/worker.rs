//! 命令队列工作线程
//!
//! 多生产者 / 单消费者：任意线程调用 [`CommandQueueWorker::enqueue`]，
//! 唯一的工作线程按 FIFO 顺序逐个执行。
//!
//! - `Cancel` 不进入队列，在入队时同步清空排队中的意图；正在执行的意图不受影响
//! - 工作线程以有界超时等待队列，以便空闲时也能观察到停止标志
//! - 单个意图失败（错误或 panic）只记录日志，工作线程继续运行

use crate::error::ControlError;
use crate::executor::{Executor, SharedController, WorkerState};
use crate::intent::MotionIntent;
use crate::metrics::{MetricsSnapshot, WorkerMetrics};
use crate::sink::{Dispatch, IntentSink};
use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 队列接收超时（停止标志的最大观察延迟）
pub const RECV_TIMEOUT: Duration = Duration::from_millis(200);

/// 命令队列工作线程
pub struct CommandQueueWorker {
    tx: Sender<MotionIntent>,
    /// 生产者侧用于 Cancel / stop 时清空队列
    drain_rx: Receiver<MotionIntent>,
    is_running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    params: Arc<ArcSwap<WorkerState>>,
    metrics: Arc<WorkerMetrics>,
    controller: SharedController,
}

impl CommandQueueWorker {
    /// 启动工作线程
    pub fn spawn(controller: SharedController, state: WorkerState) -> Result<Self, ControlError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let is_running = Arc::new(AtomicBool::new(true));
        let params = Arc::new(ArcSwap::from_pointee(state));
        let metrics = Arc::new(WorkerMetrics::new());

        let executor = Executor::new(controller.clone(), state);
        let handle = {
            let rx = rx.clone();
            let is_running = is_running.clone();
            let params = params.clone();
            let metrics = metrics.clone();
            std::thread::Builder::new()
                .name("piservo-worker".to_string())
                .spawn(move || worker_loop(rx, executor, is_running, params, metrics))
                .map_err(ControlError::WorkerSpawn)?
        };
        info!("Command queue worker started: {:?}", state);

        Ok(Self {
            tx,
            drain_rx: rx,
            is_running,
            handle: Some(handle),
            params,
            metrics,
            controller,
        })
    }

    /// 提交意图（非阻塞）
    ///
    /// `Cancel` 清空排队中的意图并返回丢弃数量，自身不入队。
    pub fn enqueue(&self, intent: MotionIntent) -> Result<Dispatch, ControlError> {
        if !self.is_running() {
            warn!("enqueue after stop: {}", intent.name());
            return Err(ControlError::WorkerStopped);
        }
        if intent.is_cancel() {
            let dropped = self.cancel();
            return Ok(Dispatch::Cancelled { dropped });
        }

        trace!("enqueue: {:?}", intent);
        self.tx.send(intent).map_err(|_| ControlError::WorkerStopped)?;
        WorkerMetrics::add(&self.metrics.enqueued, 1);
        Ok(Dispatch::Queued {
            pending: self.tx.len(),
        })
    }

    /// 解析 JSON 意图并提交；无法解析时记录并拒绝
    pub fn enqueue_json(&self, json: &str) -> Result<Dispatch, ControlError> {
        match json.parse::<MotionIntent>() {
            Ok(intent) => self.enqueue(intent),
            Err(e) => {
                WorkerMetrics::add(&self.metrics.malformed, 1);
                warn!("Dropping malformed intent {:?}: {}", json, e);
                Err(ControlError::MalformedIntent(e.to_string()))
            },
        }
    }

    /// 丢弃所有排队中的意图，返回丢弃数量
    pub fn cancel(&self) -> usize {
        let mut dropped = 0;
        while let Ok(intent) = self.drain_rx.try_recv() {
            dropped += 1;
            debug!("{:2}: cancelled {:?}", dropped, intent);
        }
        WorkerMetrics::add(&self.metrics.cancelled, dropped as u64);
        debug!("cancel: dropped {} intents", dropped);
        dropped
    }

    /// 排队中的意图数
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// 当前工作参数快照（SetParam 执行后更新）
    pub fn params(&self) -> WorkerState {
        **self.params.load()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    /// 停止：置停止标志、清空队列、等待工作线程退出
    ///
    /// 正在执行的意图会先执行完。不会给舵机断电。
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        debug!("Stopping command queue worker");
        self.is_running.store(false, Ordering::Release);
        self.cancel();
        if handle.join().is_err() {
            error!("Command queue worker panicked");
        }
        info!("Command queue worker stopped");
    }
}

impl IntentSink for CommandQueueWorker {
    fn submit(&mut self, intent: MotionIntent) -> Result<Dispatch, ControlError> {
        self.enqueue(intent)
    }
}

impl Drop for CommandQueueWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    rx: Receiver<MotionIntent>,
    mut executor: Executor,
    is_running: Arc<AtomicBool>,
    params: Arc<ArcSwap<WorkerState>>,
    metrics: Arc<WorkerMetrics>,
) {
    debug!("worker loop: start");
    while is_running.load(Ordering::Acquire) {
        let intent = match rx.recv_timeout(RECV_TIMEOUT) {
            Ok(intent) => intent,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        trace!("dequeued {} (pending {})", intent.name(), rx.len());

        let result = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&intent)));
        match result {
            Ok(Ok(())) => WorkerMetrics::add(&metrics.executed, 1),
            Ok(Err(e)) => {
                error!("{} failed: {}", intent.name(), e);
                WorkerMetrics::add(&metrics.failed, 1);
            },
            Err(panic_err) => {
                error!("{} panicked: {:?}", intent.name(), panic_err);
                WorkerMetrics::add(&metrics.failed, 1);
            },
        }

        if matches!(intent, MotionIntent::SetParam { .. }) {
            params.store(Arc::new(*executor.state()));
        }
    }
    debug!("worker loop: done");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::WorkerParam;
    use parking_lot::Mutex;
    use piservo_client::{AngleTarget, MultiAxisController};
    use piservo_driver::{ActuatorDriver, DriverError, MockDriver};
    use piservo_tools::MemoryCalibrationStore;
    use std::time::Instant;

    fn spawn_worker() -> (CommandQueueWorker, Arc<MockDriver>) {
        let drv = Arc::new(MockDriver::new());
        let ctrl = MultiAxisController::builder(drv.clone(), Arc::new(MemoryCalibrationStore::new()))
            .channels([1, 2])
            .first_move(true)
            .build()
            .unwrap();
        drv.clear_writes();
        let state = WorkerState {
            move_sec: 0.0,
            step_n: 1,
            interval_sec: 0.0,
        };
        let worker = CommandQueueWorker::spawn(Arc::new(Mutex::new(ctrl)), state).unwrap();
        (worker, drv)
    }

    fn wait_processed(worker: &CommandQueueWorker, n: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while worker.metrics().processed() < n {
            assert!(Instant::now() < deadline, "worker did not process {} intents", n);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn angles(a: f64) -> MotionIntent {
        MotionIntent::set_angles(vec![AngleTarget::Angle(a), AngleTarget::Hold])
    }

    #[test]
    fn test_fifo_order() {
        let (worker, drv) = spawn_worker();
        worker.enqueue(angles(10.0)).unwrap();
        worker.enqueue(angles(20.0)).unwrap();
        worker.enqueue(angles(30.0)).unwrap();
        wait_processed(&worker, 3);

        assert_eq!(drv.writes_for(1), vec![1611, 1722, 1833]);
    }

    #[test]
    fn test_cancel_drops_pending_only() {
        let (worker, drv) = spawn_worker();
        worker.enqueue(MotionIntent::Sleep { sec: 0.3 }).unwrap();
        // 等待 Sleep 被取出
        let deadline = Instant::now() + Duration::from_secs(5);
        while worker.pending() > 0 {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(1));
        }
        worker.enqueue(angles(45.0)).unwrap();
        worker.enqueue(angles(60.0)).unwrap();

        let dispatch = worker.enqueue(MotionIntent::Cancel).unwrap();
        assert_eq!(dispatch, Dispatch::Cancelled { dropped: 2 });

        wait_processed(&worker, 1);
        std::thread::sleep(Duration::from_millis(50));
        assert!(drv.writes_for(1).is_empty(), "cancelled moves never execute");
        assert_eq!(worker.metrics().cancelled, 2);
    }

    #[test]
    fn test_failed_intent_does_not_stop_worker() {
        let (worker, drv) = spawn_worker();
        // 长度不符 → ArgumentError
        worker
            .enqueue(MotionIntent::set_angles(vec![AngleTarget::Angle(1.0)]))
            .unwrap();
        worker.enqueue(angles(45.0)).unwrap();
        wait_processed(&worker, 2);

        let m = worker.metrics();
        assert_eq!(m.failed, 1);
        assert_eq!(m.executed, 1);
        assert_eq!(drv.pulse(1), 2000);
    }

    #[test]
    fn test_set_param_publishes_snapshot() {
        let (worker, _) = spawn_worker();
        worker
            .enqueue(MotionIntent::SetParam {
                param: WorkerParam::MoveSec,
                value: 0.75,
            })
            .unwrap();
        wait_processed(&worker, 1);
        assert_eq!(worker.params().move_sec, 0.75);
        assert_eq!(worker.params().step_n, 1);
    }

    #[test]
    fn test_enqueue_json() {
        let (worker, drv) = spawn_worker();
        assert!(matches!(
            worker.enqueue_json(r#"{"cmd":"teleport"}"#),
            Err(ControlError::MalformedIntent(_))
        ));
        worker
            .enqueue_json(r#"{"cmd":"set_angles","targets":["max",null]}"#)
            .unwrap();
        wait_processed(&worker, 1);
        assert_eq!(drv.pulse(1), 2500);
        assert_eq!(worker.metrics().malformed, 1);
    }

    #[test]
    fn test_stop_joins_and_rejects_new_intents() {
        let (mut worker, drv) = spawn_worker();
        worker.enqueue(MotionIntent::Sleep { sec: 0.1 }).unwrap();
        worker.enqueue(angles(30.0)).unwrap();
        worker.enqueue(angles(40.0)).unwrap();

        worker.stop();
        assert!(!worker.is_running());
        assert_eq!(worker.pending(), 0);
        assert!(matches!(worker.enqueue(angles(10.0)), Err(ControlError::WorkerStopped)));

        // stop 不会断电；已清空的移动不会执行
        let writes = drv.writes_for(1);
        assert!(writes.iter().all(|p| *p != 0));
        assert!(writes.len() <= 1);

        // 再次 stop 是空操作
        worker.stop();
    }

    #[test]
    fn test_idle_stop_is_prompt() {
        let (mut worker, _) = spawn_worker();
        let start = Instant::now();
        worker.stop();
        assert!(start.elapsed() < RECV_TIMEOUT * 3);
    }

    /// 写入指定脉宽时 panic 的驱动
    struct PanicOnPulse {
        inner: Arc<MockDriver>,
        poison: u32,
    }

    impl ActuatorDriver for PanicOnPulse {
        fn set_pulse(&self, channel: u32, pulse_us: u32) -> Result<(), DriverError> {
            if pulse_us == self.poison {
                panic!("driver fault on channel {}", channel);
            }
            self.inner.set_pulse(channel, pulse_us)
        }

        fn get_pulse(&self, channel: u32) -> Result<u32, DriverError> {
            self.inner.get_pulse(channel)
        }
    }

    #[test]
    fn test_panicking_intent_is_isolated() {
        let drv = Arc::new(MockDriver::new());
        let faulty = Arc::new(PanicOnPulse {
            inner: drv.clone(),
            poison: 2500,
        });
        let ctrl = MultiAxisController::builder(faulty, Arc::new(MemoryCalibrationStore::new()))
            .channels([1, 2])
            .first_move(true)
            .build()
            .unwrap();
        let state = WorkerState {
            move_sec: 0.0,
            step_n: 1,
            interval_sec: 0.0,
        };
        let worker = CommandQueueWorker::spawn(Arc::new(Mutex::new(ctrl)), state).unwrap();

        worker
            .enqueue(MotionIntent::set_angles(vec![AngleTarget::Max, AngleTarget::Hold]))
            .unwrap();
        worker
            .enqueue(MotionIntent::set_angles(vec![AngleTarget::Min, AngleTarget::Hold]))
            .unwrap();
        wait_processed(&worker, 2);

        let m = worker.metrics();
        assert_eq!(m.failed, 1);
        assert_eq!(m.executed, 1);
        assert!(worker.is_running());
        assert_eq!(drv.pulse(1), 500);
        assert_eq!(drv.pulse(2), 1500);
    }
}
