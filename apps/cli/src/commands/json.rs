//! 紧凑命令 → JSON（不连接硬件）

use crate::session::GlobalArgs;
use anyhow::{Context, Result};
use clap::Args;
use piservo_sdk::StrCmdParser;
use std::io::BufRead;

#[derive(Args, Debug)]
pub struct JsonCommand {
    /// 命令行（省略时逐行读取标准输入）
    pub line: Option<String>,

    /// 轴数（默认取配置的 pins 数量，未配置时取 angle_factor 长度）
    #[arg(short = 'n', long)]
    pub axes: Option<usize>,
}

impl JsonCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let config = global.load_config()?;
        let axes = self.axes.unwrap_or(if config.pins.is_empty() {
            config.angle_factor.len()
        } else {
            config.pins.len()
        });
        let parser = StrCmdParser::new(axes, config.factors_for(axes));

        if let Some(line) = &self.line {
            println!("{}", parser.to_json(line));
            return Ok(());
        }
        for line in std::io::stdin().lock().lines() {
            let line = line.context("读取标准输入失败")?;
            if !line.trim().is_empty() {
                println!("{}", parser.to_json(&line));
            }
        }
        Ok(())
    }
}
