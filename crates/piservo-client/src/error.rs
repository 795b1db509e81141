//! 客户端错误类型

use piservo_driver::DriverError;
use thiserror::Error;

/// 轴 / 多轴控制错误
#[derive(Error, Debug)]
pub enum ServoError {
    /// 参数错误（列表长度不符等），整批调用中止且没有任何写入
    #[error("Argument error: {0}")]
    Argument(String),

    /// 驱动调用失败，不重试
    #[error("Hardware error: {0}")]
    Hardware(#[from] DriverError),

    #[error("Axis index {index} out of range (axis count {count})")]
    AxisIndex { index: usize, count: usize },
}

impl ServoError {
    pub(crate) fn length_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        ServoError::Argument(format!("{}: expected {} values, got {}", what, expected, actual))
    }
}
