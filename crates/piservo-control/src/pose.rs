//! # 步态文本解释器
//!
//! 一行文本由空白分隔的 token 组成：
//!
//! - 数字（如 `0.5`）：`Sleep { sec }`
//! - 姿态字符串（长度 = 轴数，每个字符对应一个轴）：一次同步移动
//! - 含取消字符（默认 `z`）的 token：`Cancel`
//!
//! 默认字符表：`c` 中心、`n` 最小、`x` 最大、`f` 前进、`b` 后退、`.` 保持。
//! 大写字母角度加倍；`f`/`b` 的角度为 `angle_unit * 符号因子`，
//! 符号因子为负的轴上 min/max 互换（左右镜像安装）。

use crate::error::{ControlError, ParseError};
use crate::intent::MotionIntent;
use crate::sink::IntentSink;
use piservo_client::AngleTarget;
use piservo_driver::clip_angle;
use piservo_tools::config::{DEFAULT_ANGLE_FACTOR, DEFAULT_ANGLE_UNIT};
use tracing::{debug, warn};

/// 姿态字符的含义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseSymbol {
    Center,
    Min,
    Max,
    Forward,
    Backward,
    Hold,
    Cancel,
}

/// 字符表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    pub center: char,
    pub min: char,
    pub max: char,
    pub forward: char,
    pub backward: char,
    pub hold: char,
    pub cancel: char,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            center: 'c',
            min: 'n',
            max: 'x',
            forward: 'f',
            backward: 'b',
            hold: '.',
            cancel: 'z',
        }
    }
}

impl SymbolTable {
    /// 小写字符 → 含义
    pub fn lookup(&self, ch: char) -> Option<PoseSymbol> {
        let table = [
            (self.center, PoseSymbol::Center),
            (self.min, PoseSymbol::Min),
            (self.max, PoseSymbol::Max),
            (self.forward, PoseSymbol::Forward),
            (self.backward, PoseSymbol::Backward),
            (self.hold, PoseSymbol::Hold),
            (self.cancel, PoseSymbol::Cancel),
        ];
        table.iter().find(|(c, _)| *c == ch).map(|(_, s)| *s)
    }
}

/// token 分类结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Sleep(f64),
    Pose,
    Cancel,
}

/// 步态解释器
#[derive(Debug, Clone)]
pub struct PoseInterpreter {
    axis_count: usize,
    angle_unit: f64,
    factors: Vec<i32>,
    symbols: SymbolTable,
}

impl PoseInterpreter {
    /// 默认角度单位；符号因子取默认值 `[-1, -1, 1, 1]`，按轴数截断或以 +1 补齐
    pub fn new(axis_count: usize) -> Self {
        let factors = (0..axis_count)
            .map(|i| DEFAULT_ANGLE_FACTOR.get(i).copied().unwrap_or(1))
            .collect();
        Self {
            axis_count,
            angle_unit: DEFAULT_ANGLE_UNIT,
            factors,
            symbols: SymbolTable::default(),
        }
    }

    /// 设置符号因子；长度必须等于轴数，元素只能是 ±1
    pub fn with_factors(mut self, factors: Vec<i32>) -> Result<Self, ControlError> {
        if factors.len() != self.axis_count {
            return Err(ControlError::Config(format!(
                "angle factor length {} != axis count {}",
                factors.len(),
                self.axis_count
            )));
        }
        if let Some(f) = factors.iter().find(|f| f.abs() != 1) {
            return Err(ControlError::Config(format!("angle factor must be +1 or -1, got {}", f)));
        }
        self.factors = factors;
        Ok(self)
    }

    pub fn with_angle_unit(mut self, angle_unit: f64) -> Self {
        self.set_angle_unit(angle_unit);
        self
    }

    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    pub fn angle_unit(&self) -> f64 {
        self.angle_unit
    }

    pub fn factors(&self) -> &[i32] {
        &self.factors
    }

    /// 只接受正数，其他值忽略并返回 `false`
    pub fn set_angle_unit(&mut self, angle_unit: f64) -> bool {
        if angle_unit.is_finite() && angle_unit > 0.0 {
            self.angle_unit = angle_unit;
            debug!("angle_unit = {}", angle_unit);
            true
        } else {
            warn!("ignored angle_unit {}", angle_unit);
            false
        }
    }

    /// token 分类
    pub fn classify(&self, token: &str) -> Result<TokenKind, ParseError> {
        if let Some(sec) = token.parse::<f64>().ok().filter(|s| s.is_finite()) {
            return Ok(TokenKind::Sleep(sec));
        }
        if token.to_lowercase().contains(self.symbols.cancel) {
            return Ok(TokenKind::Cancel);
        }
        let actual = token.chars().count();
        if actual != self.axis_count {
            return Err(ParseError::InvalidLength {
                token: token.to_string(),
                expected: self.axis_count,
                actual,
            });
        }
        for ch in token.chars() {
            let lower = ch.to_lowercase().next().unwrap_or(ch);
            if self.symbols.lookup(lower).is_none() {
                return Err(ParseError::InvalidChar {
                    token: token.to_string(),
                    ch: lower,
                });
            }
        }
        Ok(TokenKind::Pose)
    }

    /// 姿态字符串 → `SetAngles`
    pub fn parse_pose(&self, token: &str) -> Result<MotionIntent, ParseError> {
        if self.classify(token)? != TokenKind::Pose {
            return Err(ParseError::InvalidCommand(token.to_string()));
        }

        let mut targets = Vec::with_capacity(self.axis_count);
        for (i, ch) in token.chars().enumerate() {
            let (lower, scale) = if ch.is_uppercase() {
                (ch.to_lowercase().next().unwrap_or(ch), 2)
            } else {
                (ch, 1)
            };
            let factor = self.factors.get(i).copied().unwrap_or(1) * scale;
            let target = match self.symbols.lookup(lower) {
                Some(PoseSymbol::Forward) => AngleTarget::Angle(clip_angle(self.angle_unit * factor as f64)),
                Some(PoseSymbol::Backward) => {
                    AngleTarget::Angle(clip_angle(-self.angle_unit * factor as f64))
                },
                Some(PoseSymbol::Center) => AngleTarget::Center,
                Some(PoseSymbol::Min) if factor < 0 => AngleTarget::Max,
                Some(PoseSymbol::Min) => AngleTarget::Min,
                Some(PoseSymbol::Max) if factor < 0 => AngleTarget::Min,
                Some(PoseSymbol::Max) => AngleTarget::Max,
                Some(PoseSymbol::Hold) | Some(PoseSymbol::Cancel) | None => AngleTarget::Hold,
            };
            targets.push(target);
        }
        debug!("pose {:?} -> {:?}", token, targets);
        Ok(MotionIntent::set_angles(targets))
    }

    /// 单个 token → 意图
    pub fn parse_token(&self, token: &str) -> Result<MotionIntent, ParseError> {
        match self.classify(token)? {
            TokenKind::Sleep(sec) => Ok(MotionIntent::Sleep { sec }),
            TokenKind::Cancel => Ok(MotionIntent::Cancel),
            TokenKind::Pose => self.parse_pose(token),
        }
    }

    /// 整行解析；错误不中断后续 token
    pub fn parse_sequence(&self, line: &str) -> Vec<Result<MotionIntent, ParseError>> {
        line.split_whitespace().map(|t| self.parse_token(t)).collect()
    }

    /// 解析并提交一个 token
    pub fn exec_command<S: IntentSink + ?Sized>(
        &self,
        sink: &mut S,
        token: &str,
    ) -> Result<MotionIntent, ControlError> {
        let intent = self.parse_token(token).inspect_err(|e| debug!("{} .. ignored", e))?;
        sink.submit(intent.clone())?;
        Ok(intent)
    }

    /// 按顺序解析并提交一行中的所有 token
    pub fn exec_sequence<S: IntentSink + ?Sized>(
        &self,
        sink: &mut S,
        line: &str,
    ) -> Vec<Result<MotionIntent, ControlError>> {
        line.split_whitespace().map(|t| self.exec_command(sink, t)).collect()
    }

    /// 左右镜像：姿态 token 字符逆序，数字 token 不变
    pub fn flip_sequence<'a, I>(tokens: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens
            .into_iter()
            .map(|t| {
                if t.parse::<f64>().is_ok() {
                    t.to_string()
                } else {
                    t.chars().rev().collect()
                }
            })
            .collect()
    }
}
