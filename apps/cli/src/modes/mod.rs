//! 交互模式

pub mod repl;
