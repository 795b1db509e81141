//! # 应用配置
//!
//! TOML 格式，所有字段都有默认值：
//!
//! ```toml
//! pins = [17, 27, 22, 25]
//! calibration_file = "servo.json"
//! angle_unit = 35.0
//! angle_factor = [-1, -1, 1, 1]
//! move_sec = 0.2
//! step_n = 40
//! interval_sec = 0.0
//!
//! [pigpio]
//! host = "localhost"
//! port = 8888
//! ```

use crate::calibration::DEFAULT_CALIBRATION_FILE;
use crate::error::ConfigError;
use crate::search::find_config_file;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "piservo.toml";

/// 同步移动默认时长（秒）
pub const DEFAULT_MOVE_SEC: f64 = 0.2;

/// 同步移动默认步数
pub const DEFAULT_STEP_N: u32 = 40;

/// 步态字符 `f`/`b` 的默认角度
pub const DEFAULT_ANGLE_UNIT: f64 = 35.0;

/// 默认符号因子（左右镜像安装的 4 轴）
pub const DEFAULT_ANGLE_FACTOR: [i32; 4] = [-1, -1, 1, 1];

/// pigpiod 连接参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PigpioConfig {
    pub host: String,
    pub port: u16,
}

impl Default for PigpioConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: piservo_driver::pigpio::DEFAULT_PORT,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 舵机 GPIO 引脚（顺序即轴序号）
    pub pins: Vec<u32>,
    /// 校准文件（文件名会被搜索，带目录的路径原样使用）
    pub calibration_file: String,
    /// 步态 `f`/`b` 的角度（度）
    pub angle_unit: f64,
    /// 每轴符号因子
    pub angle_factor: Vec<i32>,
    /// 同步移动时长（秒）
    pub move_sec: f64,
    /// 同步移动步数
    pub step_n: u32,
    /// 每次移动后的间隔（秒）
    pub interval_sec: f64,
    pub pigpio: PigpioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pins: Vec::new(),
            calibration_file: DEFAULT_CALIBRATION_FILE.to_string(),
            angle_unit: DEFAULT_ANGLE_UNIT,
            angle_factor: DEFAULT_ANGLE_FACTOR.to_vec(),
            move_sec: DEFAULT_MOVE_SEC,
            step_n: DEFAULT_STEP_N,
            interval_sec: 0.0,
            pigpio: PigpioConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// 搜索并加载；文件不存在时返回默认配置
    pub fn discover(name: &str) -> Result<Self, ConfigError> {
        let path = find_config_file(name);
        match Self::load_from_file(&path) {
            Err(e) if e.is_not_found() => {
                warn!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            },
            other => other,
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|e| ConfigError::io(path, e))
    }

    /// 字段校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.angle_unit.is_finite() && self.angle_unit > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "angle_unit must be positive, got {}",
                self.angle_unit
            )));
        }
        if !(self.move_sec.is_finite() && self.move_sec >= 0.0) {
            return Err(ConfigError::Invalid(format!("move_sec must be >= 0, got {}", self.move_sec)));
        }
        if !(self.interval_sec.is_finite() && self.interval_sec >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "interval_sec must be >= 0, got {}",
                self.interval_sec
            )));
        }
        if self.step_n == 0 {
            return Err(ConfigError::Invalid("step_n must be >= 1".to_string()));
        }
        if let Some(f) = self.angle_factor.iter().find(|f| f.abs() != 1) {
            return Err(ConfigError::Invalid(format!("angle_factor must be +1 or -1, got {}", f)));
        }
        Ok(())
    }

    /// 按轴数补齐的符号因子（缺失的轴为 +1，多余的忽略）
    pub fn factors_for(&self, axis_count: usize) -> Vec<i32> {
        (0..axis_count)
            .map(|i| self.angle_factor.get(i).copied().unwrap_or(1))
            .collect()
    }
}
