//! # Animation 模块
//!
//! 时间插值工具：缓动函数与基于时间戳的补间采样。
//!
//! 补间只关注"从开始到现在经过了多少"，不持有任何对象；
//! 由引擎例程在每帧回调里采样并写回场景与存储。

mod easing;
mod tween;

pub use easing::EasingFunction;
pub use tween::{Sample, Tween};
