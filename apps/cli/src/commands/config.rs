//! 配置显示命令

use crate::session::GlobalArgs;
use anyhow::{Context, Result};
use clap::Args;
use piservo_sdk::tools::{DEFAULT_CONFIG_FILE, find_config_file};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// 把生效的配置写入文件
    #[arg(short, long)]
    pub write: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let config = global.load_config()?;
        let source = match &global.config {
            Some(path) => path.clone(),
            None => find_config_file(DEFAULT_CONFIG_FILE),
        };

        println!("# {}", source.display());
        print!("{}", config.to_toml_string().context("序列化配置失败")?);

        if let Some(path) = &self.write {
            config
                .save_to_file(path)
                .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
            println!("✅ 已写入 {}", path.display());
        }
        Ok(())
    }
}
