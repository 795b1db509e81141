//! # piservo Tools - 校准存储与配置
//!
//! **依赖原则**: 只依赖 `piservo-driver` 的常量，不做任何硬件 IO
//!
//! ## 包含模块
//!
//! - `calibration` - 校准三元组、存储接口（JSON 文件 / 内存）
//! - `config` - 应用配置（TOML）
//! - `search` - 配置文件搜索（cwd → home → /etc）

pub mod calibration;
pub mod config;
mod error;
pub mod search;

pub use calibration::{
    CalibrationRecord, CalibrationStore, CalibrationTriple, DEFAULT_CALIBRATION_FILE,
    JsonCalibrationStore, MemoryCalibrationStore, SharedStore,
};
pub use config::{AppConfig, DEFAULT_CONFIG_FILE, PigpioConfig};
pub use error::ConfigError;
pub use search::find_config_file;
