//! 会话：配置、驱动与校准存储

use anyhow::{Context, Result};
use clap::Args;
use piservo_sdk::prelude::*;
use piservo_sdk::tools::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// 所有子命令共享的参数
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// 配置文件（默认按 ./ → ~/ → /etc/ 搜索 piservo.toml）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 使用内存 Mock 驱动（不连接 pigpiod）
    #[arg(long, global = true)]
    pub mock: bool,

    /// 调试日志
    #[arg(short, long, global = true)]
    pub debug: bool,
}

impl GlobalArgs {
    /// 加载配置；未指定文件且找不到默认文件时使用默认值
    pub fn load_config(&self) -> Result<AppConfig> {
        let config = match &self.config {
            Some(path) => AppConfig::load_from_file(path)
                .with_context(|| format!("加载配置文件失败: {}", path.display()))?,
            None => AppConfig::discover(DEFAULT_CONFIG_FILE).context("加载配置失败")?,
        };
        debug!("config: {:?}", config);
        Ok(config)
    }
}

/// 已连接的会话
pub struct Session {
    pub config: AppConfig,
    pub driver: SharedDriver,
    pub store: SharedStore,
}

impl Session {
    /// 加载配置并连接驱动
    ///
    /// pigpiod 连接失败直接返回错误（没有硬件就无法继续）。
    pub fn open(args: &GlobalArgs) -> Result<Self> {
        let config = args.load_config()?;

        let driver: SharedDriver = if args.mock {
            info!("Using mock driver");
            Arc::new(MockDriver::new())
        } else {
            let drv = PigpioDriver::connect(&config.pigpio.host, config.pigpio.port).with_context(|| {
                format!(
                    "无法连接 pigpiod ({}:{})，可以使用 --mock 离线运行",
                    config.pigpio.host, config.pigpio.port
                )
            })?;
            info!("Connected to pigpiod at {}", drv.addr());
            Arc::new(drv)
        };

        let store = JsonCalibrationStore::open(&config.calibration_file);
        info!("Calibration file: {}", store.path().display());

        Ok(Self {
            config,
            driver,
            store: Arc::new(store),
        })
    }

    /// 命令行未给出引脚时使用配置中的引脚
    pub fn resolve_pins(&self, pins: &[u32]) -> Vec<u32> {
        if pins.is_empty() {
            self.config.pins.clone()
        } else {
            pins.to_vec()
        }
    }

    /// 创建多轴控制器（所有轴先移动到中心）
    pub fn controller(&self, pins: &[u32]) -> Result<MultiAxisController> {
        let pins = self.resolve_pins(pins);
        crate::validation::validate_pins(&pins)?;
        let ctrl = MultiAxisController::builder(self.driver.clone(), self.store.clone())
            .channels(pins)
            .first_move(true)
            .build()
            .context("创建控制器失败")?;
        Ok(ctrl)
    }

    pub fn worker_state(&self) -> WorkerState {
        WorkerState::from(&self.config)
    }
}
