//! # Round Player
//!
//! 战斗回合动画播放引擎。
//!
//! ## 架构概述
//!
//! `round-player` 把时间线上的事件播放成逐帧动画。它不依赖任何渲染库或宿主计时器，
//! 所有外部协作者都是注入的 trait：
//!
//! ```text
//!                ┌──────────────┐
//! TimelineStore ─┤              ├─ MapObjectStore   (逐帧写入位置/透明度、特效对象)
//!  (游标/事件)    │ RoundAnimator │
//! SceneGraph ────┤              ├─ ProgressTracker  (移动进度，供路径预览)
//!  (节点查询)     └──────┬───────┘
//!                       │ request_frame / set_timeout
//!                       ▼
//!                   Scheduler  ◄── FrameLoopScheduler（宿主帧循环或测试虚拟时钟）
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! let mut session = PlaybackSession::new(timeline, store, scene, progress, config);
//!
//! // 宿主帧循环
//! loop {
//!     session.tick(now_ms());
//! }
//!
//! // 关闭时
//! session.teardown();
//! ```
//!
//! ## 模块结构
//!
//! - [`engine`]：引擎、各类行动例程、节点查找、游标订阅
//! - [`session`]：会话（执行器 + 调度器 + 引擎）
//! - [`scheduler`]：调度端口与帧循环调度器
//! - [`scene`]：场景图端口与内存场景树
//! - [`animation`]：缓动与补间
//! - [`progress`]：动画进度
//! - [`config`]：播放配置
//! - [`error`]：错误类型

pub mod animation;
pub mod config;
pub mod engine;
pub mod error;
mod pending;
pub mod progress;
pub mod scene;
pub mod scheduler;
pub mod session;

// 重导出核心类型
pub use animation::{EasingFunction, Sample, Tween};
pub use config::{PlaybackConfig, SpellTimingConfig};
pub use engine::timing::{SpellTiming, spell_timing, travel_time};
pub use engine::{CursorSubscription, PlaybackPorts, RoundAnimator, resolve_token_node};
pub use error::{ConfigError, PlaybackError};
pub use pending::PendingRegistry;
pub use progress::{ProgressBoard, ProgressTracker, TokenProgress};
pub use scene::{NodeId, NodeKind, SceneGraph, SceneTree};
pub use scheduler::{
    FrameCallback, FrameHandle, FrameLoopScheduler, Scheduler, SchedulerStats, TimerCallback,
    TimerHandle,
};
pub use session::PlaybackSession;
