//! 驱动层错误类型定义

use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// Socket / IO 错误
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// pigpiod 返回负的错误码
    #[error("pigpio command {cmd} failed with code {code}")]
    Command { cmd: u32, code: i32 },

    /// 脉宽超出硬件可接受范围（既不是 0，也不在 500..=2500）
    #[error("Invalid pulse width: {0}us")]
    InvalidPulse(u32),

    /// 设备错误（断开、注入的故障等）
    #[error("Device Error: {0}")]
    Device(String),
}

impl DriverError {
    /// 是否为连接级故障（后续调用也必然失败）
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Io(_))
    }
}
