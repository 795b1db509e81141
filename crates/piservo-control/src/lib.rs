//! # piservo Control
//!
//! 异步运动执行层：
//!
//! - [`MotionIntent`]：生产者与工作线程之间交换的结构化命令（带 JSON 形式）
//! - [`CommandQueueWorker`]：单消费者 FIFO 工作线程，支持取消
//! - [`PoseInterpreter`]：步态文本（`fbcc 0.5 ...`）→ 意图
//! - [`StrCmdParser`]：紧凑命令（`mv:10,20 sl:0.5 ...`）→ 意图
//! - [`ServoHandle`]：持有控制器与工作线程，结束时断电
//!
//! ## 示例
//!
//! ```no_run
//! use piservo_control::{PoseInterpreter, ServoHandle, WorkerState};
//! use piservo_client::MultiAxisController;
//! use piservo_driver::MockDriver;
//! use piservo_tools::MemoryCalibrationStore;
//! use std::sync::Arc;
//!
//! let controller = MultiAxisController::new(
//!     &[17, 27, 22, 25],
//!     Arc::new(MockDriver::new()),
//!     Arc::new(MemoryCalibrationStore::new()),
//! );
//! let mut handle = ServoHandle::new(controller, WorkerState::default())?;
//! let pose = PoseInterpreter::new(4);
//! pose.exec_sequence(&mut handle, "fccc 0.5 cccc");
//! handle.end();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod executor;
mod handle;
pub mod intent;
mod metrics;
pub mod pose;
pub mod sink;
pub mod str_cmd;
pub mod worker;

pub use error::{ControlError, ParseError};
pub use executor::{Executor, SharedController, WorkerState};
pub use handle::ServoHandle;
pub use intent::{MotionIntent, WorkerParam};
pub use metrics::{MetricsSnapshot, WorkerMetrics};
pub use pose::{PoseInterpreter, PoseSymbol, SymbolTable, TokenKind};
pub use sink::{DirectExecutor, Dispatch, IntentSink};
pub use str_cmd::StrCmdParser;
pub use worker::{CommandQueueWorker, RECV_TIMEOUT};
