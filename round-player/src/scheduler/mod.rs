//! # Scheduler 模块
//!
//! 帧/定时器调度端口。
//!
//! 动画例程不直接依赖宿主的帧循环与计时器，而是通过 [`Scheduler`] 请求回调：
//!
//! ```text
//! request_frame(cb) ──► 下一帧回调 cb(now)
//! set_timeout(ms, cb) ──► ms 毫秒后回调 cb()
//! cancel_frame / clear_timeout ──► 回调被丢弃，永不执行
//! ```
//!
//! 时间单位统一为毫秒（`f64`）。

mod frame_loop;

pub use frame_loop::{FrameLoopScheduler, SchedulerStats};

/// 帧回调，参数为当前时间（毫秒）
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// 定时器回调
pub type TimerCallback = Box<dyn FnOnce()>;

/// 帧请求句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// 定时器句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// 调度器接口
///
/// 单线程使用，所有方法都是 `&self`。
/// 实现方必须保证：被取消的回调不会再执行，且取消时回调会被丢弃。
pub trait Scheduler {
    /// 当前时间（毫秒）
    fn now(&self) -> f64;

    /// 请求下一帧回调
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// 取消帧请求
    fn cancel_frame(&self, handle: FrameHandle);

    /// 在 `delay_ms` 毫秒后回调
    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle;

    /// 取消定时器
    fn clear_timeout(&self, handle: TimerHandle);
}
