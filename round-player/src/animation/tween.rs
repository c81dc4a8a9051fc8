//! # Tween 模块
//!
//! 基于时间戳的补间。
//!
//! 与按 `dt` 累加的动画不同，补间每帧用"当前时间 - 开始时间"重新计算进度，
//! 因此掉帧不会累积误差，最后一帧总是精确落在终点。

use super::EasingFunction;

/// 单次采样结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// 原始进度（0.0 - 1.0，未应用缓动）
    pub raw: f32,
    /// 缓动后的进度
    pub eased: f32,
    /// 是否已到达终点
    pub finished: bool,
}

impl Sample {
    /// 在 `from` 与 `to` 之间按缓动进度插值（结束时精确返回 `to`）
    pub fn lerp(&self, from: f32, to: f32) -> f32 {
        if self.finished {
            to
        } else {
            from + (to - from) * self.eased
        }
    }
}

/// 补间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    /// 开始时间（毫秒）
    pub started_at: f64,
    /// 时长（毫秒）
    pub duration: f64,
    /// 缓动函数
    pub easing: EasingFunction,
}

impl Tween {
    /// 创建补间（负时长按 0 处理）
    pub fn new(started_at: f64, duration: f64, easing: EasingFunction) -> Self {
        Self {
            started_at,
            duration: if duration.is_finite() {
                duration.max(0.0)
            } else {
                0.0
            },
            easing,
        }
    }

    /// 是否为瞬时补间
    pub fn is_instant(&self) -> bool {
        self.duration <= 0.0
    }

    /// 在 `now` 时刻采样
    pub fn sample(&self, now: f64) -> Sample {
        if self.is_instant() {
            return Sample {
                raw: 1.0,
                eased: 1.0,
                finished: true,
            };
        }

        let raw = ((now - self.started_at) / self.duration).clamp(0.0, 1.0) as f32;
        let finished = raw >= 1.0;
        Sample {
            raw,
            eased: if finished { 1.0 } else { self.easing.apply(raw) },
            finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_progress() {
        let tween = Tween::new(100.0, 200.0, EasingFunction::Linear);

        let start = tween.sample(100.0);
        assert_eq!(start.raw, 0.0);
        assert!(!start.finished);

        let mid = tween.sample(200.0);
        assert_eq!(mid.raw, 0.5);
        assert_eq!(mid.lerp(0.0, 10.0), 5.0);

        let end = tween.sample(300.0);
        assert!(end.finished);
        assert_eq!(end.eased, 1.0);
    }

    #[test]
    fn test_sample_clamps_past_end() {
        let tween = Tween::new(0.0, 100.0, EasingFunction::Smoothstep);
        let late = tween.sample(5000.0);
        assert_eq!(late.raw, 1.0);
        assert!(late.finished);

        let early = tween.sample(-50.0);
        assert_eq!(early.raw, 0.0);
    }

    #[test]
    fn test_instant_tween() {
        let tween = Tween::new(0.0, -10.0, EasingFunction::Linear);
        assert!(tween.is_instant());
        assert!(tween.sample(0.0).finished);

        let tween = Tween::new(0.0, f64::NAN, EasingFunction::Linear);
        assert!(tween.is_instant());
    }

    #[test]
    fn test_lerp_exact_at_end() {
        let tween = Tween::new(0.0, 3.0, EasingFunction::Smoothstep);
        assert_eq!(tween.sample(3.0).lerp(0.1, 0.7), 0.7);
    }
}
