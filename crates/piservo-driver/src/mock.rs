//! 内存驱动
//!
//! 不接触任何硬件，记录每一次 `set_pulse` 调用。用于单元测试、集成测试
//! 以及 CLI 的 `--mock` 模式。

use crate::constants::{PULSE_OFF, is_valid_pulse};
use crate::{ActuatorDriver, DriverError};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::trace;

/// 一次脉宽写入记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseWrite {
    pub channel: u32,
    pub pulse_us: u32,
}

#[derive(Debug, Default)]
struct MockState {
    pulses: HashMap<u32, u32>,
    writes: Vec<PulseWrite>,
    fail_writes: bool,
}

/// 内存驱动（带写入日志）
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置某通道的当前脉宽（不计入写入日志）
    pub fn with_pulse(self, channel: u32, pulse_us: u32) -> Self {
        self.state.lock().pulses.insert(channel, pulse_us);
        self
    }

    /// 当前脉宽（未写过的通道为 0）
    pub fn pulse(&self, channel: u32) -> u32 {
        self.state.lock().pulses.get(&channel).copied().unwrap_or(PULSE_OFF)
    }

    /// 全部写入记录（按时间顺序）
    pub fn writes(&self) -> Vec<PulseWrite> {
        self.state.lock().writes.clone()
    }

    /// 某通道的写入脉宽序列
    pub fn writes_for(&self, channel: u32) -> Vec<u32> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.channel == channel)
            .map(|w| w.pulse_us)
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// 打开后所有 `set_pulse` 都返回 `DriverError::Device`（模拟断线）
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }
}

impl ActuatorDriver for MockDriver {
    fn set_pulse(&self, channel: u32, pulse_us: u32) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(DriverError::Device(format!("mock channel {} disconnected", channel)));
        }
        if !is_valid_pulse(pulse_us) {
            return Err(DriverError::InvalidPulse(pulse_us));
        }
        trace!("mock set_pulse: channel={}, pulse={}", channel, pulse_us);
        state.pulses.insert(channel, pulse_us);
        state.writes.push(PulseWrite { channel, pulse_us });
        Ok(())
    }

    fn get_pulse(&self, channel: u32) -> Result<u32, DriverError> {
        Ok(self.pulse(channel))
    }
}
