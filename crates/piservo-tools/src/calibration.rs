//! # 校准数据与存储
//!
//! 每个通道一组 `(min, center, max)` 脉宽，满足 `min <= center <= max`，
//! 且都在绝对范围 `[PULSE_MIN, PULSE_MAX]` 内。
//!
//! 文件格式（JSON，按 pin 排序）：
//!
//! ```json
//! [
//!   { "pin": 17, "min": 600, "center": 1450, "max": 2400 },
//!   { "pin": 27, "min": 500, "center": 1500, "max": 2500 }
//! ]
//! ```

use crate::error::ConfigError;
use crate::search::find_config_file;
use parking_lot::Mutex;
use piservo_driver::{PULSE_CENTER, PULSE_MAX, PULSE_MIN, clip_pulse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, warn};

/// 默认校准文件名
pub const DEFAULT_CALIBRATION_FILE: &str = "servo.json";

/// 校准三元组（微秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationTriple {
    pub min: u32,
    pub center: u32,
    pub max: u32,
}

impl Default for CalibrationTriple {
    fn default() -> Self {
        Self {
            min: PULSE_MIN,
            center: PULSE_CENTER,
            max: PULSE_MAX,
        }
    }
}

impl CalibrationTriple {
    /// 构造并规范化
    pub fn new(min: u32, center: u32, max: u32) -> Self {
        Self { min, center, max }.sanitized()
    }

    /// 裁剪到绝对范围，并以 center 为基准恢复顺序
    pub fn sanitized(self) -> Self {
        let center = clip_pulse(self.center as i64);
        Self {
            min: clip_pulse(self.min as i64).min(center),
            center,
            max: clip_pulse(self.max as i64).max(center),
        }
    }

    /// 设置 min：裁剪后不超过 center
    pub fn with_min(self, pulse: u32) -> Self {
        Self {
            min: clip_pulse(pulse as i64).min(self.center),
            ..self
        }
    }

    /// 设置 center：裁剪后夹在 `[min, max]` 内
    pub fn with_center(self, pulse: u32) -> Self {
        Self {
            center: clip_pulse(pulse as i64).clamp(self.min, self.max),
            ..self
        }
    }

    /// 设置 max：裁剪后不低于 center
    pub fn with_max(self, pulse: u32) -> Self {
        Self {
            max: clip_pulse(pulse as i64).max(self.center),
            ..self
        }
    }

    pub fn is_ordered(&self) -> bool {
        PULSE_MIN <= self.min
            && self.min <= self.center
            && self.center <= self.max
            && self.max <= PULSE_MAX
    }
}

/// 文件中的一条记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub pin: u32,
    #[serde(flatten)]
    pub calibration: CalibrationTriple,
}

/// 校准存储接口
///
/// `load` 读不到（文件缺失、格式错误）时返回 `None`，调用方使用默认值。
pub trait CalibrationStore: Send + Sync {
    fn load(&self, channel: u32) -> Option<CalibrationTriple>;

    fn save(&self, channel: u32, triple: CalibrationTriple) -> Result<(), ConfigError>;
}

/// 共享存储句柄
pub type SharedStore = Arc<dyn CalibrationStore>;

/// JSON 文件存储
///
/// 每次 `save` 都是读-改-写整个文件；内部锁保证同一进程内不会交错写入。
#[derive(Debug)]
pub struct JsonCalibrationStore {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl JsonCalibrationStore {
    /// 使用给定路径（不做搜索）
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!("Calibration file: {}", path.display());
        Self {
            path,
            io_lock: Mutex::new(()),
        }
    }

    /// 按 cwd → home → /etc 搜索文件名
    pub fn open(name: &str) -> Self {
        Self::new(find_config_file(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取全部记录
    ///
    /// 文件不存在视为空列表。
    pub fn records(&self) -> Result<Vec<CalibrationRecord>, ConfigError> {
        let _guard = self.io_lock.lock();
        self.read_records()
    }

    fn read_records(&self) -> Result<Vec<CalibrationRecord>, ConfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Calibration file not found: {}", self.path.display());
                return Ok(Vec::new());
            },
            Err(e) => return Err(ConfigError::io(&self.path, e)),
        };
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write_records(&self, mut records: Vec<CalibrationRecord>) -> Result<(), ConfigError> {
        records.sort_by_key(|r| r.pin);
        let json = serde_json::to_string_pretty(&records).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json + "\n").map_err(|e| ConfigError::io(&self.path, e))
    }
}

impl CalibrationStore for JsonCalibrationStore {
    fn load(&self, channel: u32) -> Option<CalibrationTriple> {
        match self.records() {
            Ok(records) => records
                .into_iter()
                .find(|r| r.pin == channel)
                .map(|r| r.calibration.sanitized()),
            Err(e) => {
                error!("Failed to read calibration: {}", e);
                None
            },
        }
    }

    fn save(&self, channel: u32, triple: CalibrationTriple) -> Result<(), ConfigError> {
        let _guard = self.io_lock.lock();
        let mut records = self.read_records().unwrap_or_else(|e| {
            warn!("Overwriting unreadable calibration file: {}", e);
            Vec::new()
        });
        records.retain(|r| r.pin != channel);
        records.push(CalibrationRecord {
            pin: channel,
            calibration: triple,
        });
        self.write_records(records)?;
        debug!("Saved calibration: pin={}, {:?}", channel, triple);
        Ok(())
    }
}

/// 内存存储（测试、`--mock` 模式）
#[derive(Debug, Default)]
pub struct MemoryCalibrationStore {
    entries: Mutex<BTreeMap<u32, CalibrationTriple>>,
    saves: AtomicUsize,
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, channel: u32, triple: CalibrationTriple) -> Self {
        self.entries.lock().insert(channel, triple);
        self
    }

    /// 已保存次数
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn get(&self, channel: u32) -> Option<CalibrationTriple> {
        self.entries.lock().get(&channel).copied()
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&self, channel: u32) -> Option<CalibrationTriple> {
        self.get(channel)
    }

    fn save(&self, channel: u32, triple: CalibrationTriple) -> Result<(), ConfigError> {
        self.entries.lock().insert(channel, triple);
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
