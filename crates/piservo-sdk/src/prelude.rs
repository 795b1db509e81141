//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use piservo_sdk::prelude::*;
//! ```

// 客户端层
pub use piservo_client::{AngleTarget, CalibratedAxis, CalibrationTarget, MultiAxisController};

// 控制层
pub use piservo_control::{
    CommandQueueWorker, DirectExecutor, Dispatch, IntentSink, MotionIntent, PoseInterpreter,
    ServoHandle, StrCmdParser, WorkerParam, WorkerState,
};

// 驱动层
pub use piservo_driver::{ActuatorDriver, MockDriver, PigpioDriver, SharedDriver};

// 校准与配置
pub use piservo_tools::{
    AppConfig, CalibrationStore, CalibrationTriple, JsonCalibrationStore, MemoryCalibrationStore,
    SharedStore,
};

// 错误类型
pub use piservo_client::ServoError;
pub use piservo_control::{ControlError, ParseError};
pub use piservo_driver::DriverError;
pub use piservo_tools::ConfigError;
