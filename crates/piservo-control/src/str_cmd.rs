//! # 紧凑命令解析
//!
//! 形如 `key:params` 的 token，key 不区分大小写：
//!
//! | key | 意图 |
//! |---|---|
//! | `mv:a,b,..` | `SetAngles`（元素：[-90, 90] 整数、`c`/`n`/`x`/`center`/`min`/`max`、`.` 保持） |
//! | `sl:sec` | `Sleep` |
//! | `ms:sec` / `is:sec` | 修改 `move_sec` / `interval_sec` |
//! | `st:n` | 修改 `step_n`（n >= 1） |
//! | `mp:axis,diff` | 单轴强制脉宽微调 |
//! | `sc:axis` / `sn:axis` / `sx:axis` | 以当前脉宽设置 center / min / max |
//! | `ca` / `zz` | `Cancel` |
//!
//! 符号因子为负的轴：角度取反、min/max 互换、脉宽微调方向取反。

use crate::error::ParseError;
use crate::intent::{MotionIntent, WorkerParam};
use piservo_client::{AngleTarget, CalibrationTarget};
use serde_json::{Value, json};
use tracing::debug;

/// 紧凑命令解析器
#[derive(Debug, Clone)]
pub struct StrCmdParser {
    axis_count: usize,
    factors: Vec<i32>,
}

impl StrCmdParser {
    /// `factors` 不足轴数的部分按 +1 处理，多余部分忽略
    pub fn new(axis_count: usize, factors: Vec<i32>) -> Self {
        debug!("StrCmdParser: axis_count={}, factors={:?}", axis_count, factors);
        Self { axis_count, factors }
    }

    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    pub fn factors(&self) -> &[i32] {
        &self.factors
    }

    pub fn set_factors(&mut self, factors: Vec<i32>) {
        self.factors = factors;
    }

    fn factor(&self, i: usize) -> i32 {
        self.factors.get(i).copied().unwrap_or(1)
    }

    /// 单个 token → 意图
    pub fn parse_token(&self, token: &str) -> Result<MotionIntent, ParseError> {
        let invalid = || ParseError::InvalidCommand(token.to_string());

        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let (key, param) = match token.split_once(':') {
            Some((key, param)) => (key.to_lowercase(), param),
            None => (token.to_lowercase(), ""),
        };

        let intent = match key.as_str() {
            "mv" => MotionIntent::set_angles(self.parse_angles(param).ok_or_else(invalid)?),
            "sl" => MotionIntent::Sleep {
                sec: parse_sec(param).ok_or_else(invalid)?,
            },
            "ms" => MotionIntent::SetParam {
                param: WorkerParam::MoveSec,
                value: parse_sec(param).ok_or_else(invalid)?,
            },
            "is" => MotionIntent::SetParam {
                param: WorkerParam::IntervalSec,
                value: parse_sec(param).ok_or_else(invalid)?,
            },
            "st" => {
                let n = param.trim().parse::<i64>().ok().filter(|n| *n >= 1).ok_or_else(invalid)?;
                MotionIntent::SetParam {
                    param: WorkerParam::StepN,
                    value: n as f64,
                }
            },
            "mp" => {
                let (axis, diff) = param.split_once(',').ok_or_else(invalid)?;
                let axis = self.parse_axis(axis).ok_or_else(invalid)?;
                let diff = diff.trim().parse::<i32>().map_err(|_| invalid())?;
                let mut diffs = vec![None; self.axis_count];
                diffs[axis] = Some(diff.saturating_mul(self.factor(axis)));
                MotionIntent::SetPulsesRelative { diffs }
            },
            "sc" | "sn" | "sx" => {
                let axis = self.parse_axis(param).ok_or_else(invalid)?;
                let target = match key.as_str() {
                    "sn" => CalibrationTarget::Min,
                    "sx" => CalibrationTarget::Max,
                    _ => CalibrationTarget::Center,
                };
                let target = if self.factor(axis) < 0 {
                    target.mirrored()
                } else {
                    target
                };
                MotionIntent::SetCalibration { axis, target }
            },
            "ca" | "zz" if param.is_empty() => MotionIntent::Cancel,
            _ => return Err(invalid()),
        };
        debug!("{:?} -> {:?}", token, intent);
        Ok(intent)
    }

    /// 整行解析：遇到第一个错误即停止，错误本身包含在结果末尾
    pub fn parse_line(&self, line: &str) -> Vec<Result<MotionIntent, ParseError>> {
        let mut results = Vec::new();
        for token in line.split_whitespace() {
            let result = self.parse_token(token);
            let failed = result.is_err();
            results.push(result);
            if failed {
                break;
            }
        }
        results
    }

    /// 整行 → JSON 数组；错误项为 `{"err": token}`
    pub fn to_json(&self, line: &str) -> Value {
        Value::Array(
            self.parse_line(line)
                .into_iter()
                .map(|r| match r {
                    Ok(intent) => serde_json::to_value(&intent).unwrap_or(Value::Null),
                    Err(e) => json!({ "err": e.token() }),
                })
                .collect(),
        )
    }

    fn parse_axis(&self, s: &str) -> Option<usize> {
        s.trim().parse::<usize>().ok().filter(|i| *i < self.axis_count)
    }

    fn parse_angles(&self, param: &str) -> Option<Vec<AngleTarget>> {
        if param.is_empty() {
            return None;
        }
        param
            .split(',')
            .enumerate()
            .map(|(i, part)| {
                let target = match part.trim().to_lowercase().as_str() {
                    "" => return None,
                    "." => AngleTarget::Hold,
                    "c" | "center" => AngleTarget::Center,
                    "n" | "min" => AngleTarget::Min,
                    "x" | "max" => AngleTarget::Max,
                    num => {
                        let angle = num.parse::<i32>().ok().filter(|a| (-90..=90).contains(a))?;
                        AngleTarget::Angle(f64::from(angle))
                    },
                };
                Some(if self.factor(i) < 0 {
                    target.mirrored()
                } else {
                    target
                })
            })
            .collect()
    }
}

fn parse_sec(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}
