//! 交互式行输入（calib / cmd 共用）
//!
//! 保留历史记录；Ctrl+C 不退出，交给调用方处理（取消排队中的命令）。

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic::{self, AssertUnwindSafe};

/// 一次读取的结果
#[derive(Debug, PartialEq, Eq)]
pub enum ReplEvent {
    Line(String),
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D、exit、quit 或输入错误
    Exit,
}

pub struct LineReader {
    rl: DefaultEditor,
    history_path: String,
}

impl LineReader {
    pub fn new(history_path: &str) -> Result<Self> {
        let mut rl =
            DefaultEditor::new().map_err(|e| anyhow::anyhow!("Failed to initialize readline: {}", e))?;
        rl.load_history(history_path).ok(); // 首次运行没有历史文件
        Ok(Self {
            rl,
            history_path: history_path.to_string(),
        })
    }

    /// 读取一行（空行跳过）
    pub fn read(&mut self, prompt: &str) -> ReplEvent {
        loop {
            match self.rl.readline(prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "exit" || line == "quit" || line == "q" {
                        return ReplEvent::Exit;
                    }
                    let _ = self.rl.add_history_entry(line.as_str());
                    return ReplEvent::Line(line);
                },
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    return ReplEvent::Interrupt;
                },
                Err(ReadlineError::Eof) => return ReplEvent::Exit,
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    return ReplEvent::Exit;
                },
            }
        }
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        self.rl.save_history(&self.history_path).ok();
    }
}

/// 执行一条交互命令，错误与 panic 只打印，不终止会话
pub fn run_isolated<F>(line: &str, f: F)
where
    F: FnOnce() -> Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {},
        Ok(Err(err)) => eprintln!("❌ {}: {}", line, err),
        Err(panic_err) => eprintln!("❌ Command panicked: {:?}", panic_err),
    }
}
