//! 角度目标与校准目标类型

use piservo_driver::{ANGLE_CENTER, ANGLE_MAX, ANGLE_MIN};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 单轴角度目标
///
/// JSON 表示：数字、`"min"`/`"center"`/`"max"`，或 `null`（保持）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AngleTarget {
    /// 角度（度），执行时裁剪到 `[-90, 90]`
    Angle(f64),
    Min,
    Center,
    Max,
    /// 保持当前角度
    #[default]
    Hold,
}

impl AngleTarget {
    /// 符号目标对应的角度；`Hold` 返回 `None`
    pub fn symbolic_angle(&self) -> Option<f64> {
        match self {
            AngleTarget::Angle(d) => Some(*d),
            AngleTarget::Min => Some(ANGLE_MIN),
            AngleTarget::Center => Some(ANGLE_CENTER),
            AngleTarget::Max => Some(ANGLE_MAX),
            AngleTarget::Hold => None,
        }
    }

    /// 镜像：数值取反，min/max 互换
    pub fn mirrored(self) -> Self {
        match self {
            AngleTarget::Angle(d) => AngleTarget::Angle(-d),
            AngleTarget::Min => AngleTarget::Max,
            AngleTarget::Max => AngleTarget::Min,
            other => other,
        }
    }
}

impl From<f64> for AngleTarget {
    fn from(deg: f64) -> Self {
        AngleTarget::Angle(deg)
    }
}

impl From<Option<f64>> for AngleTarget {
    fn from(deg: Option<f64>) -> Self {
        deg.map_or(AngleTarget::Hold, AngleTarget::Angle)
    }
}

impl fmt::Display for AngleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AngleTarget::Angle(d) => write!(f, "{}", d),
            AngleTarget::Min => f.write_str("min"),
            AngleTarget::Center => f.write_str("center"),
            AngleTarget::Max => f.write_str("max"),
            AngleTarget::Hold => f.write_str("hold"),
        }
    }
}

/// 无法识别的角度目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAngleTarget(pub String);

impl fmt::Display for InvalidAngleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid angle target '{}'", self.0)
    }
}

impl std::error::Error for InvalidAngleTarget {}

impl FromStr for AngleTarget {
    type Err = InvalidAngleTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "." | "hold" => Ok(AngleTarget::Hold),
            "min" => Ok(AngleTarget::Min),
            "center" => Ok(AngleTarget::Center),
            "max" => Ok(AngleTarget::Max),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite())
                .map(AngleTarget::Angle)
                .ok_or_else(|| InvalidAngleTarget(s.to_string())),
        }
    }
}

impl Serialize for AngleTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AngleTarget::Angle(d) => serializer.serialize_f64(*d),
            AngleTarget::Min => serializer.serialize_str("min"),
            AngleTarget::Center => serializer.serialize_str("center"),
            AngleTarget::Max => serializer.serialize_str("max"),
            AngleTarget::Hold => serializer.serialize_none(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Number(f64),
    Word(String),
}

impl<'de> Deserialize<'de> for AngleTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<RawTarget>::deserialize(deserializer)? {
            None => Ok(AngleTarget::Hold),
            Some(RawTarget::Number(d)) => Ok(AngleTarget::Angle(d)),
            Some(RawTarget::Word(w)) => w.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// 校准目标（min / center / max 三者之一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationTarget {
    Min,
    Center,
    Max,
}

impl CalibrationTarget {
    /// 镜像安装的轴上 min/max 互换
    pub fn mirrored(self) -> Self {
        match self {
            CalibrationTarget::Min => CalibrationTarget::Max,
            CalibrationTarget::Max => CalibrationTarget::Min,
            CalibrationTarget::Center => CalibrationTarget::Center,
        }
    }

    /// 校准目标对应的角度
    pub fn angle(self) -> f64 {
        match self {
            CalibrationTarget::Min => ANGLE_MIN,
            CalibrationTarget::Center => ANGLE_CENTER,
            CalibrationTarget::Max => ANGLE_MAX,
        }
    }
}

impl fmt::Display for CalibrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CalibrationTarget::Min => "min",
            CalibrationTarget::Center => "center",
            CalibrationTarget::Max => "max",
        })
    }
}

impl FromStr for CalibrationTarget {
    type Err = InvalidAngleTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" | "n" => Ok(CalibrationTarget::Min),
            "center" | "c" => Ok(CalibrationTarget::Center),
            "max" | "x" => Ok(CalibrationTarget::Max),
            _ => Err(InvalidAngleTarget(s.to_string())),
        }
    }
}
