//! # piservo CLI
//!
//! Command-line interface for calibrated servo motion.
//!
//! ## 一次性命令
//!
//! ```bash
//! # 单个舵机：移动到脉宽后断电
//! piservo-cli servo 17 1500 --sec 1
//!
//! # 步态：4 轴，重复 3 次
//! piservo-cli pose 17 27 22 25 --seq "fccc 0.2 cfcc 0.2" --count 3
//!
//! # 紧凑命令 → JSON（不需要硬件）
//! piservo-cli json "mv:30,.,c sl:0.5"
//! ```
//!
//! ## 交互模式
//!
//! ```bash
//! $ piservo-cli calib 17
//! calib[17:center]> +20
//! calib[17:center]> set
//!
//! $ piservo-cli cmd 17 27 22 25
//! cmd> mv:30,30,-30,-30 sl:0.5 mv:c,c,c,c
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod modes;
mod session;
mod utils;
mod validation;

use commands::{CalibCommand, CmdCommand, ConfigCommand, JsonCommand, PoseCommand, ServoCommand};
use session::GlobalArgs;

/// piservo CLI - 舵机命令行工具
#[derive(Parser, Debug)]
#[command(name = "piservo-cli")]
#[command(about = "Command-line interface for calibrated servo motion", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 单个舵机脉宽移动（结束后断电）
    Servo {
        #[command(flatten)]
        args: ServoCommand,
    },

    /// 交互式校准
    Calib {
        #[command(flatten)]
        args: CalibCommand,
    },

    /// 步态序列
    Pose {
        #[command(flatten)]
        args: PoseCommand,
    },

    /// 紧凑命令（交互式或单行）
    Cmd {
        #[command(flatten)]
        args: CmdCommand,
    },

    /// 紧凑命令 → JSON 意图
    Json {
        #[command(flatten)]
        args: JsonCommand,
    },

    /// 显示生效的配置
    Config {
        #[command(flatten)]
        args: ConfigCommand,
    },
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn,piservo_cli=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(debug).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    match cli.command {
        Commands::Servo { args } => args.execute(&cli.global),
        Commands::Calib { args } => args.execute(&cli.global),
        Commands::Pose { args } => args.execute(&cli.global),
        Commands::Cmd { args } => args.execute(&cli.global),
        Commands::Json { args } => args.execute(&cli.global),
        Commands::Config { args } => args.execute(&cli.global),
    }
}
