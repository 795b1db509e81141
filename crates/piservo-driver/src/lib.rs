//! # piservo Driver Layer
//!
//! 舵机脉宽驱动抽象层，提供统一的 `ActuatorDriver` 接口。
//!
//! ## 模块
//!
//! - `constants`: 脉宽/角度常量（与硬件无关）
//! - `pigpio`: pigpiod 守护进程 socket 客户端
//! - `mock`: 内存驱动（测试、无硬件调试）
//!
//! 上层（`piservo-client`）只依赖 [`ActuatorDriver`] trait，不关心具体后端。

use std::sync::Arc;

pub mod constants;
mod error;
pub mod mock;
pub mod pigpio;

pub use constants::*;
pub use error::DriverError;
pub use mock::{MockDriver, PulseWrite};
pub use pigpio::PigpioDriver;

/// 脉宽驱动接口
///
/// 所有方法都只需要 `&self`：一个驱动句柄被多个轴共享，
/// 具体实现自己负责内部同步（Mutex 等）。
///
/// - `channel`: 通道号（GPIO 引脚号）
/// - `pulse_us`: 脉宽（微秒），`PULSE_OFF`(0) 表示断电
pub trait ActuatorDriver: Send + Sync {
    /// 设置脉宽。硬件断开时返回错误，不会自动重试。
    fn set_pulse(&self, channel: u32, pulse_us: u32) -> Result<(), DriverError>;

    /// 读取当前脉宽（0 = 断电）
    fn get_pulse(&self, channel: u32) -> Result<u32, DriverError>;

    /// 断电
    fn off(&self, channel: u32) -> Result<(), DriverError> {
        self.set_pulse(channel, PULSE_OFF)
    }
}

impl<T: ActuatorDriver + ?Sized> ActuatorDriver for Arc<T> {
    fn set_pulse(&self, channel: u32, pulse_us: u32) -> Result<(), DriverError> {
        (**self).set_pulse(channel, pulse_us)
    }

    fn get_pulse(&self, channel: u32) -> Result<u32, DriverError> {
        (**self).get_pulse(channel)
    }

    fn off(&self, channel: u32) -> Result<(), DriverError> {
        (**self).off(channel)
    }
}

/// 共享驱动句柄（多个轴共用一个后端）
pub type SharedDriver = Arc<dyn ActuatorDriver>;
