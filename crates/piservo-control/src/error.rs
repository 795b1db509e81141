//! 控制层错误类型

use piservo_client::ServoError;
use thiserror::Error;

/// 文本命令解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 姿态字符串长度与轴数不符
    #[error("'{token}': invalid length")]
    InvalidLength {
        token: String,
        expected: usize,
        actual: usize,
    },

    /// 姿态字符串包含未知字符
    #[error("'{ch}': invalid char")]
    InvalidChar { token: String, ch: char },

    /// 紧凑命令（`mv:`/`sl:` 等）无法解析
    #[error("'{0}': invalid command")]
    InvalidCommand(String),
}

impl ParseError {
    /// 出错的原始 token
    pub fn token(&self) -> &str {
        match self {
            ParseError::InvalidLength { token, .. } => token,
            ParseError::InvalidChar { token, .. } => token,
            ParseError::InvalidCommand(token) => token,
        }
    }
}

/// 控制层错误
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Servo error: {0}")]
    Servo(#[from] ServoError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// 工作线程已停止，不再接受命令
    #[error("Worker stopped")]
    WorkerStopped,

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// 命令格式正确但取值非法，或 JSON 无法解析
    #[error("Malformed intent: {0}")]
    MalformedIntent(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
