//! # Session 模块
//!
//! 播放会话：把调度器、执行器、引擎和游标订阅组装在一起。
//!
//! ```text
//! 宿主帧循环 ──► session.tick(now)
//!                  ├─ LocalPool::run_until_stalled   (推进已就绪的例程)
//!                  ├─ FrameLoopScheduler::advance_to  (触发到期的定时器与帧)
//!                  └─ LocalPool::run_until_stalled   (例程处理新的帧/定时器)
//! ```
//!
//! 会话销毁时（[`PlaybackSession::teardown`] 或 `Drop`）才会调用 `stop_all`；
//! [`PlaybackSession::resubscribe`] 只替换游标监听，不影响正在播放的动画。

use std::rc::Rc;

use futures::executor::LocalPool;
use tabletop_model::{Cursor, MapObjectStore, TimelineStore};
use tracing::{debug, info};

use crate::config::PlaybackConfig;
use crate::engine::{CursorSubscription, PlaybackPorts, RoundAnimator};
use crate::progress::ProgressTracker;
use crate::scene::SceneGraph;
use crate::scheduler::{FrameLoopScheduler, Scheduler};

/// 播放会话
pub struct PlaybackSession {
    pool: LocalPool,
    scheduler: Rc<FrameLoopScheduler>,
    timeline: Rc<dyn TimelineStore>,
    animator: RoundAnimator,
    subscription: Option<CursorSubscription>,
    torn_down: bool,
}

impl PlaybackSession {
    /// 创建会话并订阅游标变化
    pub fn new(
        timeline: Rc<dyn TimelineStore>,
        store: Rc<dyn MapObjectStore>,
        scene: Rc<dyn SceneGraph>,
        progress: Rc<dyn ProgressTracker>,
        config: PlaybackConfig,
    ) -> Self {
        let scheduler = Rc::new(FrameLoopScheduler::new());
        let ports = PlaybackPorts {
            timeline: Rc::clone(&timeline),
            store,
            scene,
            progress,
            scheduler: scheduler.clone(),
        };
        let animator = RoundAnimator::new(ports, config);
        let pool = LocalPool::new();
        let subscription = animator.subscribe(pool.spawner());

        Self {
            pool,
            scheduler,
            timeline,
            animator,
            subscription: Some(subscription),
            torn_down: false,
        }
    }

    /// 引擎
    pub fn animator(&self) -> &RoundAnimator {
        &self.animator
    }

    /// 调度器
    pub fn scheduler(&self) -> &FrameLoopScheduler {
        &self.scheduler
    }

    /// 当前时间（毫秒）
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    /// 运行所有已就绪的例程
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// 推进到 `now` 并运行例程
    ///
    /// # 返回
    /// 本次触发的回调数
    pub fn tick(&mut self, now: f64) -> usize {
        self.pool.run_until_stalled();
        let fired = self.scheduler.advance_to(now);
        self.pool.run_until_stalled();
        fired
    }

    /// 推进 `dt_ms` 毫秒并运行例程
    pub fn advance(&mut self, dt_ms: f64) -> usize {
        let now = self.scheduler.now() + dt_ms.max(0.0);
        self.tick(now)
    }

    /// 进入 `cursor` 指向的事件
    ///
    /// 游标变化时由订阅触发播放；游标已经在该位置时直接启动播放。
    pub fn enter(&mut self, cursor: Cursor) {
        if self.timeline.cursor() == cursor {
            self.animator.spawn_run_at(&self.pool.spawner(), cursor);
        } else {
            self.timeline.set_cursor(cursor);
        }
        self.pool.run_until_stalled();
    }

    /// 重新订阅游标（不取消正在播放的动画）
    pub fn resubscribe(&mut self) {
        // 先注销旧监听，避免同一次游标变化触发两次播放
        self.subscription = None;
        self.subscription = Some(self.animator.subscribe(self.pool.spawner()));
        debug!("已重新订阅游标");
    }

    /// 是否订阅中
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// 是否没有任何进行中的播放
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle() && self.animator.active_tasks() == 0
    }

    /// 按固定帧间隔推进，直到没有进行中的播放
    ///
    /// # 返回
    /// 是否在 `max_frames` 帧内进入空闲
    pub fn run_to_idle(&mut self, frame_ms: f64, max_frames: usize) -> bool {
        self.pool.run_until_stalled();
        for _ in 0..max_frames {
            if self.is_idle() {
                return true;
            }
            self.advance(frame_ms);
        }
        self.is_idle()
    }

    /// 销毁会话：注销监听并取消所有未完成的调度
    ///
    /// # 返回
    /// 被取消的句柄数（重复调用返回 0）
    pub fn teardown(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;
        self.subscription = None;

        let cancelled = self.animator.stop_all();
        // 让被取消的例程结束
        self.pool.run_until_stalled();
        info!(cancelled, "播放会话已销毁");
        cancelled
    }

    /// 是否已销毁
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
