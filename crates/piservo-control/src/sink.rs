//! 意图下游
//!
//! 解释器不关心意图是同步执行还是排队执行，只依赖 [`IntentSink`]。

use crate::error::ControlError;
use crate::executor::{Executor, SharedController, WorkerState};
use crate::intent::MotionIntent;

/// 提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// 已同步执行完毕
    Executed,
    /// 已进入队列，`pending` 为入队后的队列长度
    Queued { pending: usize },
    /// Cancel：丢弃了 `dropped` 个排队中的意图
    Cancelled { dropped: usize },
}

/// 意图下游
pub trait IntentSink {
    fn submit(&mut self, intent: MotionIntent) -> Result<Dispatch, ControlError>;
}

/// 同步执行（调用线程上直接驱动控制器）
pub struct DirectExecutor {
    executor: Executor,
}

impl DirectExecutor {
    pub fn new(controller: SharedController, state: WorkerState) -> Self {
        Self {
            executor: Executor::new(controller, state),
        }
    }

    pub fn state(&self) -> &WorkerState {
        self.executor.state()
    }
}

impl IntentSink for DirectExecutor {
    fn submit(&mut self, intent: MotionIntent) -> Result<Dispatch, ControlError> {
        if intent.is_cancel() {
            return Ok(Dispatch::Cancelled { dropped: 0 });
        }
        self.executor.execute(&intent)?;
        Ok(Dispatch::Executed)
    }
}

impl<S: IntentSink + ?Sized> IntentSink for &mut S {
    fn submit(&mut self, intent: MotionIntent) -> Result<Dispatch, ControlError> {
        (**self).submit(intent)
    }
}
