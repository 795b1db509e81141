//! Ctrl+C 处理与工作线程等待

use anyhow::{Context, Result};
use piservo_sdk::{ControlError, ServoHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Ctrl+C 标志（进程内只安装一次处理器）
#[derive(Clone)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn install() -> Result<Self> {
        let flag = Arc::new(AtomicBool::new(false));
        let handler_flag = flag.clone();
        ctrlc::set_handler(move || {
            eprintln!("\n🛑 收到 Ctrl+C，取消排队中的命令...");
            handler_flag.store(true, Ordering::SeqCst);
        })
        .context("安装 Ctrl+C 处理器失败")?;
        Ok(Self { flag })
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// 等待工作线程处理完所有已入队的意图；Ctrl+C 时取消剩余部分
pub fn wait_idle(handle: &ServoHandle, interrupt: Option<&Interrupt>) {
    loop {
        let m = handle.metrics();
        if m.processed() + m.cancelled >= m.enqueued {
            break;
        }
        if interrupt.is_some_and(Interrupt::is_set) {
            let dropped = handle.cancel();
            debug!("interrupted: dropped {} intents", dropped);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// 打印一行命令中解析或提交失败的 token
pub fn report_errors<T>(results: &[Result<T, ControlError>]) {
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        eprintln!("⚠️  {}", err);
    }
}
