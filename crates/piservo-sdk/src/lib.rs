//! piservo SDK - 树莓派舵机运动控制 Rust SDK
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **驱动层** (`driver`): 脉宽输出抽象，pigpiod 客户端与内存 Mock
//! - **工具层** (`tools`): 校准存储与应用配置
//! - **客户端层** (`client`): 已校准单轴与多轴同步运动
//! - **控制层** (`control`): 运动意图、命令队列工作线程、文本命令解释器
//!
//! # 快速开始
//!
//! ```no_run
//! use piservo_sdk::prelude::*;
//! use std::sync::Arc;
//!
//! piservo_sdk::init_logger();
//!
//! let controller = MultiAxisController::builder(
//!     Arc::new(MockDriver::new()),
//!     Arc::new(MemoryCalibrationStore::new()),
//! )
//! .channels([17, 27, 22, 25])
//! .build()?;
//!
//! let mut handle = ServoHandle::new(controller, WorkerState::default())?;
//! PoseInterpreter::new(4).exec_sequence(&mut handle, "fccc 0.3 cccc");
//! handle.end();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use piservo_client as client;
pub use piservo_control as control;
pub use piservo_driver as driver;
pub use piservo_tools as tools;

pub mod prelude;

// --- 常用类型 ---

pub use piservo_client::{
    AngleTarget, CalibratedAxis, CalibrationTarget, MultiAxisController, ServoError,
};
pub use piservo_control::{
    CommandQueueWorker, ControlError, MotionIntent, ParseError, PoseInterpreter, ServoHandle,
    StrCmdParser, WorkerState,
};
pub use piservo_driver::{ActuatorDriver, DriverError, MockDriver, PigpioDriver};
pub use piservo_tools::{AppConfig, ConfigError};

/// 安装 `tracing` 订阅器（`RUST_LOG` 控制过滤，默认 `info`）
///
/// 重复调用是安全的：已有全局订阅器时直接返回。
pub fn init_logger() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::debug!("logger initialized");
    }
}
