//! 子命令定义和实现

pub mod calib;
pub mod cmd;
pub mod config;
pub mod json;
pub mod pose;
pub mod servo;

pub use calib::CalibCommand;
pub use cmd::CmdCommand;
pub use config::ConfigCommand;
pub use json::JsonCommand;
pub use pose::PoseCommand;
pub use servo::ServoCommand;
