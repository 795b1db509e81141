//! 步态序列命令
//!
//! `--threaded` 时通过命令队列工作线程执行（解析与运动并行）；
//! 否则在当前线程上逐个执行。

use crate::session::{GlobalArgs, Session};
use crate::utils::{Interrupt, report_errors, wait_idle};
use anyhow::{Context, Result};
use clap::Args;
use parking_lot::Mutex;
use piservo_sdk::prelude::*;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub struct PoseCommand {
    /// GPIO 引脚（省略时使用配置中的 pins）
    pub pins: Vec<u32>,

    /// 步态序列，例如 "fccc 0.2 cfcc 0.2"
    #[arg(short, long)]
    pub seq: String,

    /// 重复次数
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,

    /// 左右镜像
    #[arg(long)]
    pub flip: bool,

    /// 通过工作线程执行
    #[arg(short, long)]
    pub threaded: bool,

    /// 角度单位（覆盖配置）
    #[arg(short, long)]
    pub angle_unit: Option<f64>,

    /// 同步移动时长（秒，覆盖配置）
    #[arg(long)]
    pub move_sec: Option<f64>,

    /// 同步移动步数（覆盖配置）
    #[arg(long)]
    pub step_n: Option<u32>,
}

impl PoseCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let session = Session::open(global)?;
        let ctrl = session.controller(&self.pins)?;
        let axis_count = ctrl.axis_count();

        let mut state = session.worker_state();
        if let Some(sec) = self.move_sec {
            state.apply(WorkerParam::MoveSec, sec).context("--move-sec")?;
        }
        if let Some(n) = self.step_n {
            state.apply(WorkerParam::StepN, f64::from(n)).context("--step-n")?;
        }

        let pose = PoseInterpreter::new(axis_count)
            .with_factors(session.config.factors_for(axis_count))?
            .with_angle_unit(self.angle_unit.unwrap_or(session.config.angle_unit));

        let tokens: Vec<String> = if self.flip {
            PoseInterpreter::flip_sequence(self.seq.split_whitespace())
        } else {
            self.seq.split_whitespace().map(str::to_string).collect()
        };
        let line = tokens.join(" ");
        info!("pose: {:?} x {} ({:?})", line, self.count, state);

        let interrupt = Interrupt::install()?;
        if self.threaded {
            let mut handle = ServoHandle::new(ctrl, state)?;
            for _ in 0..self.count {
                if interrupt.is_set() {
                    break;
                }
                report_errors(&pose.exec_sequence(&mut handle, &line));
            }
            wait_idle(&handle, Some(&interrupt));
            println!("{}", serde_json::to_string(&handle.metrics())?);
            handle.end();
        } else {
            let controller = Arc::new(Mutex::new(ctrl));
            let mut exec = DirectExecutor::new(controller.clone(), state);
            'outer: for _ in 0..self.count {
                for token in &tokens {
                    if interrupt.is_set() {
                        break 'outer;
                    }
                    if let Err(e) = pose.exec_command(&mut exec, token) {
                        eprintln!("⚠️  {}", e);
                    }
                }
            }
            controller.lock().off()?;
        }
        Ok(())
    }
}
