//! # piservo Client
//!
//! 已校准舵机轴与多轴同步运动。
//!
//! - [`CalibratedAxis`]: 单通道 + 校准三元组，角度 ↔ 脉宽换算、范围裁剪、校准设置
//! - [`MultiAxisController`]: 有序轴集合，批量移动与同步插值移动
//!
//! 驱动与校准存储都以 trait 对象注入（`piservo_driver::SharedDriver`、
//! `piservo_tools::SharedStore`），本 crate 不依赖任何具体后端。

mod axis;
mod error;
mod multi;
mod types;

pub use axis::CalibratedAxis;
pub use error::ServoError;
pub use multi::{ControllerBuilder, DEFAULT_MOVE_SEC, DEFAULT_STEP_N, MultiAxisController};
pub use types::{AngleTarget, CalibrationTarget, InvalidAngleTarget};
