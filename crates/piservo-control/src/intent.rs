//! 运动意图（Motion Intent）
//!
//! 外部生产者（控制台、网络端点）与工作线程之间交换的结构化命令。
//! JSON 形式为带 `cmd` 判别字段的对象：
//!
//! ```json
//! {"cmd": "set_angles", "targets": [30, null, "center", -10], "move_sec": 0.5}
//! {"cmd": "sleep", "sec": 1.0}
//! {"cmd": "set_param", "param": "step_n", "value": 20}
//! {"cmd": "set_calibration", "axis": 1, "target": "max"}
//! {"cmd": "cancel"}
//! ```

use piservo_client::{AngleTarget, CalibrationTarget};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 可在运行时调整的工作参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerParam {
    /// 同步移动时长（秒）
    MoveSec,
    /// 同步移动步数
    StepN,
    /// 每次移动后的间隔（秒）
    IntervalSec,
}

impl fmt::Display for WorkerParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkerParam::MoveSec => "move_sec",
            WorkerParam::StepN => "step_n",
            WorkerParam::IntervalSec => "interval_sec",
        })
    }
}

/// 运动意图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum MotionIntent {
    /// 同步插值移动到绝对目标；缺省的时长 / 步数取工作参数
    #[serde(alias = "move", alias = "move_all_angles_sync")]
    SetAngles {
        #[serde(alias = "angles")]
        targets: Vec<AngleTarget>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        move_sec: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_n: Option<u32>,
    },

    /// 同步插值相对移动（当前角度 + deltas）
    #[serde(alias = "move_all_angles_sync_relative")]
    SetAnglesRelative {
        #[serde(alias = "angle_diffs")]
        deltas: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        move_sec: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_n: Option<u32>,
    },

    /// 无插值直接移动
    #[serde(alias = "move_all_angles")]
    SetAnglesImmediate {
        #[serde(alias = "angles")]
        targets: Vec<AngleTarget>,
    },

    /// 强制脉宽相对移动（`null` 的轴不动）
    #[serde(alias = "move_all_pulses_relative")]
    SetPulsesRelative {
        #[serde(alias = "pulse_diffs")]
        diffs: Vec<Option<i32>>,
    },

    /// 修改工作参数
    SetParam { param: WorkerParam, value: f64 },

    /// 在工作线程上阻塞休眠，推迟后续命令
    Sleep { sec: f64 },

    /// 把指定轴的当前脉宽存为校准值
    #[serde(alias = "set")]
    SetCalibration {
        #[serde(alias = "servo")]
        axis: usize,
        target: CalibrationTarget,
    },

    /// 丢弃所有排队中的命令（不进入队列）
    Cancel,
}

impl MotionIntent {
    /// 判别名（与 JSON `cmd` 字段一致）
    pub fn name(&self) -> &'static str {
        match self {
            MotionIntent::SetAngles { .. } => "set_angles",
            MotionIntent::SetAnglesRelative { .. } => "set_angles_relative",
            MotionIntent::SetAnglesImmediate { .. } => "set_angles_immediate",
            MotionIntent::SetPulsesRelative { .. } => "set_pulses_relative",
            MotionIntent::SetParam { .. } => "set_param",
            MotionIntent::Sleep { .. } => "sleep",
            MotionIntent::SetCalibration { .. } => "set_calibration",
            MotionIntent::Cancel => "cancel",
        }
    }

    pub fn set_angles(targets: Vec<AngleTarget>) -> Self {
        MotionIntent::SetAngles {
            targets,
            move_sec: None,
            step_n: None,
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, MotionIntent::Cancel)
    }

    /// 是否会驱动舵机运动（执行后需要休眠 interval）
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            MotionIntent::SetAngles { .. }
                | MotionIntent::SetAnglesRelative { .. }
                | MotionIntent::SetAnglesImmediate { .. }
                | MotionIntent::SetPulsesRelative { .. }
        )
    }

    pub fn to_json(&self) -> String {
        // 所有字段都是可序列化的普通数据
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"cmd\":\"{}\"}}", self.name()))
    }
}

impl std::str::FromStr for MotionIntent {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_angles_json() {
        let intent = MotionIntent::SetAngles {
            targets: vec![AngleTarget::Angle(30.0), AngleTarget::Hold, AngleTarget::Center],
            move_sec: Some(0.5),
            step_n: None,
        };
        let json = intent.to_json();
        assert_eq!(json, r#"{"cmd":"set_angles","targets":[30.0,null,"center"],"move_sec":0.5}"#);
        assert_eq!(json.parse::<MotionIntent>().unwrap(), intent);
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let intent: MotionIntent = r#"{"cmd":"set_angles","targets":[1,2]}"#.parse().unwrap();
        assert_eq!(
            intent,
            MotionIntent::set_angles(vec![AngleTarget::Angle(1.0), AngleTarget::Angle(2.0)])
        );
    }

    #[test]
    fn test_legacy_command_names() {
        let intent: MotionIntent = r#"{"cmd":"move","angles":[10,null,"max"]}"#.parse().unwrap();
        assert!(matches!(intent, MotionIntent::SetAngles { ref targets, .. } if targets.len() == 3));

        let intent: MotionIntent = r#"{"cmd":"set","servo":2,"target":"min"}"#.parse().unwrap();
        assert_eq!(
            intent,
            MotionIntent::SetCalibration {
                axis: 2,
                target: CalibrationTarget::Min
            }
        );

        let intent: MotionIntent =
            r#"{"cmd":"move_all_pulses_relative","pulse_diffs":[20,null,-5]}"#.parse().unwrap();
        assert_eq!(
            intent,
            MotionIntent::SetPulsesRelative {
                diffs: vec![Some(20), None, Some(-5)]
            }
        );
    }

    #[test]
    fn test_other_variants() {
        let cases = [
            (r#"{"cmd":"sleep","sec":0.25}"#, MotionIntent::Sleep { sec: 0.25 }),
            (
                r#"{"cmd":"set_param","param":"step_n","value":10.0}"#,
                MotionIntent::SetParam {
                    param: WorkerParam::StepN,
                    value: 10.0,
                },
            ),
            (r#"{"cmd":"cancel"}"#, MotionIntent::Cancel),
        ];
        for (json, intent) in cases {
            assert_eq!(json.parse::<MotionIntent>().unwrap(), intent);
            assert_eq!(intent.to_json(), json);
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!("{\"cmd\":\"fly\"}".parse::<MotionIntent>().is_err());
        assert!("{\"targets\":[1]}".parse::<MotionIntent>().is_err());
        assert!("{\"cmd\":\"sleep\"}".parse::<MotionIntent>().is_err());
        assert!("not json".parse::<MotionIntent>().is_err());
    }

    #[test]
    fn test_classification_helpers() {
        assert!(MotionIntent::Cancel.is_cancel());
        assert!(MotionIntent::SetPulsesRelative { diffs: vec![] }.is_motion());
        assert!(!MotionIntent::Sleep { sec: 1.0 }.is_motion());
        assert_eq!(MotionIntent::Sleep { sec: 1.0 }.name(), "sleep");
    }
}
