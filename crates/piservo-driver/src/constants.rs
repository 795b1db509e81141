//! 脉宽与角度常量
//!
//! 所有脉宽单位为微秒（µs），角度单位为度。

/// 断电脉宽
pub const PULSE_OFF: u32 = 0;

/// 绝对最小脉宽
pub const PULSE_MIN: u32 = 500;

/// 默认中心脉宽
pub const PULSE_CENTER: u32 = 1500;

/// 绝对最大脉宽
pub const PULSE_MAX: u32 = 2500;

/// 最小角度（对应校准 min）
pub const ANGLE_MIN: f64 = -90.0;

/// 中心角度（对应校准 center）
pub const ANGLE_CENTER: f64 = 0.0;

/// 最大角度（对应校准 max）
pub const ANGLE_MAX: f64 = 90.0;

/// 将任意脉宽裁剪到绝对范围 `[PULSE_MIN, PULSE_MAX]`
#[inline]
pub fn clip_pulse(pulse: i64) -> u32 {
    pulse.clamp(PULSE_MIN as i64, PULSE_MAX as i64) as u32
}

/// 将角度裁剪到 `[ANGLE_MIN, ANGLE_MAX]`
#[inline]
pub fn clip_angle(deg: f64) -> f64 {
    deg.clamp(ANGLE_MIN, ANGLE_MAX)
}

/// 脉宽是否可以直接写入硬件（断电值或绝对范围内）
#[inline]
pub fn is_valid_pulse(pulse: u32) -> bool {
    pulse == PULSE_OFF || (PULSE_MIN..=PULSE_MAX).contains(&pulse)
}
