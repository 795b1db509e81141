//! 紧凑命令：交互式 Shell 或单行执行

use crate::modes::repl::{LineReader, ReplEvent, run_isolated};
use crate::session::{GlobalArgs, Session};
use crate::utils::{Interrupt, wait_idle};
use anyhow::Result;
use clap::Args;
use piservo_sdk::prelude::*;

const HISTORY_FILE: &str = ".piservo_cmd_history";

#[derive(Args, Debug)]
pub struct CmdCommand {
    /// GPIO 引脚（省略时使用配置中的 pins）
    pub pins: Vec<u32>,

    /// 执行一行命令后退出，例如 "mv:30,.,c sl:0.5 mv:c,c,c"
    #[arg(short, long)]
    pub exec: Option<String>,
}

impl CmdCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let session = Session::open(global)?;
        let ctrl = session.controller(&self.pins)?;
        let axis_count = ctrl.axis_count();
        let parser = StrCmdParser::new(axis_count, session.config.factors_for(axis_count));
        let mut handle = ServoHandle::new(ctrl, session.worker_state())?;

        if let Some(line) = &self.exec {
            let interrupt = Interrupt::install()?;
            submit_line(&parser, &handle, line)?;
            wait_idle(&handle, Some(&interrupt));
        } else {
            run_shell(&parser, &handle)?;
        }

        handle.end();
        Ok(())
    }
}

/// 解析并入队；解析错误以 `{"err": token}` 形式打印，错误之后的部分不执行
fn submit_line(parser: &StrCmdParser, handle: &ServoHandle, line: &str) -> Result<()> {
    for result in parser.parse_line(line) {
        match result {
            Ok(intent) => {
                handle.send(intent)?;
            },
            Err(e) => println!("{}", serde_json::json!({ "err": e.token() })),
        }
    }
    Ok(())
}

fn run_shell(parser: &StrCmdParser, handle: &ServoHandle) -> Result<()> {
    let mut input = LineReader::new(HISTORY_FILE)?;
    println!("piservo-cli v{} - 紧凑命令 Shell", env!("CARGO_PKG_VERSION"));
    println!("输入 'help' 查看帮助，'exit' 退出，Ctrl+C 取消排队中的命令");

    loop {
        match input.read("cmd> ") {
            ReplEvent::Line(line) => match line.as_str() {
                "help" => print_help(),
                "status" => {
                    println!("params:  {}", serde_json::to_string(&handle.params())?);
                    println!("metrics: {}", serde_json::to_string(&handle.metrics())?);
                    println!("pending: {}", handle.worker().pending());
                },
                _ => run_isolated(&line, || submit_line(parser, handle, &line)),
            },
            ReplEvent::Interrupt => {
                let dropped = handle.cancel();
                println!("🛑 已取消 {} 条命令", dropped);
            },
            ReplEvent::Exit => break,
        }
    }
    Ok(())
}

fn print_help() {
    println!("命令（空格分隔，可一行多条）:");
    println!("  mv:a,b,..      同步移动（角度 -90..90 / c / n / x / . 保持）");
    println!("  sl:SEC         休眠");
    println!("  ms:SEC         同步移动时长");
    println!("  st:N           同步移动步数");
    println!("  is:SEC         移动后间隔");
    println!("  mp:AXIS,DIFF   脉宽微调");
    println!("  sc|sn|sx:AXIS  以当前脉宽设置 center / min / max");
    println!("  ca | zz        取消排队中的命令");
    println!("  status         工作参数与统计");
    println!("  exit           退出（断电）");
}
