//! # Easing 模块
//!
//! 缓动函数，用于动画的时间插值。

use tabletop_model::MoveEasing;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// 平滑步进（两头慢中间快，`3t² - 2t³`）
    #[default]
    Smoothstep,
}

impl EasingFunction {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值 (0.0 - 1.0)，两端精确等于 0 和 1
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::Smoothstep => t * t * (3.0 - 2.0 * t),
        }
    }
}

impl From<MoveEasing> for EasingFunction {
    fn from(value: MoveEasing) -> Self {
        match value {
            MoveEasing::Linear => Self::Linear,
            MoveEasing::Smooth => Self::Smoothstep,
        }
    }
}
