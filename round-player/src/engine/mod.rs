//! # Engine 模块
//!
//! 回合动画引擎：把事件中的行动按顺序播放成时间动画。
//!
//! ## 执行流程
//!
//! ```text
//! 游标变化 ──► run_round(event)
//!                 │ 查找事件、token 图层
//!                 │ 按 order 稳定排序
//!                 ▼
//!          ┌─► animate_action ──► Move / Appear / Disappear / Spell 例程
//!          │      │ 逐帧写入场景与对象存储
//!          │      ▼
//!          └── 标记行动已执行（严格串行，上一个完成后才开始下一个）
//!                 ▼
//!          标记事件已执行
//! ```
//!
//! 例程挂起在帧/定时器 future 上，这些调度都登记在 [`PendingRegistry`] 中，
//! [`RoundAnimator::stop_all`] 可以一次性取消。

mod fade;
mod movement;
mod resolve;
mod spell;
mod subscription;
pub mod timing;

pub use resolve::resolve_token_node;
pub use subscription::CursorSubscription;

use std::cell::Cell;
use std::rc::{Rc, Weak};

use futures::executor::LocalSpawner;
use futures::lock::Mutex;
use futures::task::LocalSpawnExt;
use tabletop_model::{Action, ActionData, Cursor, MapObjectStore, TimelineStore};
use tracing::{debug, info, warn};

use crate::animation::{EasingFunction, Sample, Tween};
use crate::config::PlaybackConfig;
use crate::error::PlaybackError;
use crate::pending::{Pending, PendingRegistry};
use crate::progress::ProgressTracker;
use crate::scene::{NodeId, SceneGraph};
use crate::scheduler::Scheduler;

/// 引擎依赖的外部端口
#[derive(Clone)]
pub struct PlaybackPorts {
    /// 时间线存储
    pub timeline: Rc<dyn TimelineStore>,
    /// 地图对象存储
    pub store: Rc<dyn MapObjectStore>,
    /// 场景图
    pub scene: Rc<dyn SceneGraph>,
    /// 动画进度
    pub progress: Rc<dyn ProgressTracker>,
    /// 帧/定时器调度
    pub scheduler: Rc<dyn Scheduler>,
}

struct Inner {
    timeline: Rc<dyn TimelineStore>,
    store: Rc<dyn MapObjectStore>,
    scene: Rc<dyn SceneGraph>,
    progress: Rc<dyn ProgressTracker>,
    pending: Pending,
    config: PlaybackConfig,
    /// 特效 ID 序号
    effect_seq: Cell<u64>,
    /// 每次 stop_all 递增，排队中的事件据此放弃播放
    generation: Cell<u64>,
    /// 正在运行（含排队）的播放任务数
    active_tasks: Cell<usize>,
    /// 事件播放互斥：同一时刻只有一个事件在播放
    gate: Mutex<()>,
}

/// 回合动画引擎
///
/// 克隆开销很小，克隆体共享同一份状态。
#[derive(Clone)]
pub struct RoundAnimator {
    inner: Rc<Inner>,
}

impl RoundAnimator {
    /// 创建引擎
    pub fn new(ports: PlaybackPorts, config: PlaybackConfig) -> Self {
        let pending = Pending::new(ports.scheduler, Rc::new(PendingRegistry::new()));
        Self {
            inner: Rc::new(Inner {
                timeline: ports.timeline,
                store: ports.store,
                scene: ports.scene,
                progress: ports.progress,
                pending,
                config,
                effect_seq: Cell::new(0),
                generation: Cell::new(0),
                active_tasks: Cell::new(0),
                gate: Mutex::new(()),
            }),
        }
    }

    /// 当前配置
    pub fn config(&self) -> &PlaybackConfig {
        &self.inner.config
    }

    /// 播放单个行动
    ///
    /// token 类行动需要传入场景节点；节点为 `None` 时直接返回。
    /// 施法行动不需要节点。
    pub async fn animate_action(
        &self,
        action: &Action,
        node: Option<NodeId>,
    ) -> Result<(), PlaybackError> {
        let cursor = self.inner.timeline.cursor();
        self.inner.animate_action(action, node, cursor).await
    }

    /// 播放当前回合中编号为 `event_number` 的事件
    pub async fn run_round(&self, event_number: u32) -> Result<(), PlaybackError> {
        let round = self.inner.timeline.cursor().round;
        self.inner.run_at(Cursor::new(round, event_number)).await
    }

    /// 播放指定游标位置的事件
    pub async fn run_at(&self, cursor: Cursor) -> Result<(), PlaybackError> {
        self.inner.run_at(cursor).await
    }

    /// 按事件顺序播放整个回合
    pub async fn replay_round(&self, round_number: u32) -> Result<(), PlaybackError> {
        let Some(round) = self.inner.timeline.round(round_number) else {
            debug!(round = round_number, "回合不存在，跳过重播");
            return Ok(());
        };

        let mut numbers: Vec<u32> = round.events.iter().map(|e| e.number).collect();
        numbers.sort_unstable();
        numbers.dedup();

        info!(round = round_number, events = numbers.len(), "重播回合");
        for number in numbers {
            self.inner.run_at(Cursor::new(round_number, number)).await?;
        }
        Ok(())
    }

    /// 取消所有未完成的帧请求和定时器
    ///
    /// 只应在引擎销毁时调用。正在播放的事件以 [`PlaybackError::Cancelled`] 结束，
    /// 排队等待的事件也不会再开始。
    ///
    /// # 返回
    /// 被取消的句柄数
    pub fn stop_all(&self) -> usize {
        self.inner.generation.set(self.inner.generation.get() + 1);
        let cancelled = self.inner.pending.stop_all();
        if cancelled > 0 {
            warn!(cancelled, "已取消所有未完成的动画调度");
        }
        cancelled
    }

    /// 登记中的帧请求数
    pub fn pending_frames(&self) -> usize {
        self.inner.pending.registry().frame_count()
    }

    /// 登记中的定时器数
    pub fn pending_timers(&self) -> usize {
        self.inner.pending.registry().timer_count()
    }

    /// 正在运行（含排队）的播放任务数
    pub fn active_tasks(&self) -> usize {
        self.inner.active_tasks.get()
    }

    /// 在 `spawner` 上启动一次事件播放（不等待）
    pub fn spawn_run_at(&self, spawner: &LocalSpawner, cursor: Cursor) {
        spawn_run(&self.inner, spawner, cursor);
    }

    /// 订阅游标变化：每次游标移动都在 `spawner` 上启动一次事件播放
    ///
    /// 丢弃返回的 [`CursorSubscription`] 只会注销监听，不会取消正在播放的动画。
    pub fn subscribe(&self, spawner: LocalSpawner) -> CursorSubscription {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let listener = Rc::new(move |cursor: Cursor| {
            if let Some(inner) = weak.upgrade() {
                spawn_run(&inner, &spawner, cursor);
            }
        });

        let id = self.inner.timeline.subscribe(listener);
        debug!("已订阅游标变化");
        CursorSubscription::new(Rc::clone(&self.inner.timeline), id)
    }
}

fn spawn_run(inner: &Rc<Inner>, spawner: &LocalSpawner, cursor: Cursor) {
    inner.active_tasks.set(inner.active_tasks.get() + 1);

    // 在启动时记下代数：任务首次被轮询前发生的 stop_all 也要生效
    let generation = inner.generation.get();
    let task_inner = Rc::clone(inner);
    let spawned = spawner.spawn_local(async move {
        if let Err(e) = task_inner.run_in_generation(cursor, generation).await {
            warn!(cursor = %cursor, error = %e, "事件播放中断");
        }
        task_inner
            .active_tasks
            .set(task_inner.active_tasks.get().saturating_sub(1));
    });

    if let Err(e) = spawned {
        inner
            .active_tasks
            .set(inner.active_tasks.get().saturating_sub(1));
        warn!(cursor = %cursor, error = ?e, "无法启动事件播放任务");
    }
}

impl Inner {
    /// 播放速度（非正或非有限值按 1 处理）
    fn speed(&self) -> f64 {
        let speed = self.timeline.animation_speed();
        if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        }
    }

    async fn run_at(&self, cursor: Cursor) -> Result<(), PlaybackError> {
        self.run_in_generation(cursor, self.generation.get()).await
    }

    async fn run_in_generation(
        &self,
        cursor: Cursor,
        generation: u64,
    ) -> Result<(), PlaybackError> {
        let _turn = self.gate.lock().await;
        if self.generation.get() != generation {
            debug!(cursor = %cursor, "引擎已停止，放弃排队中的事件");
            return Err(PlaybackError::Cancelled);
        }

        let Some(event) = self.timeline.event(cursor.round, cursor.event) else {
            debug!(cursor = %cursor, "事件不存在");
            return Ok(());
        };
        if event.actions.is_empty() {
            debug!(cursor = %cursor, "事件没有行动");
            return Ok(());
        }
        if event.executed && !self.config.replay_executed_events {
            debug!(cursor = %cursor, event = %event.id, "事件已执行，跳过");
            return Ok(());
        }

        let Some(container) = self.scene.find_layer(&self.config.token_layer) else {
            debug!(layer = %self.config.token_layer, "token 图层尚未挂载，跳过播放");
            return Ok(());
        };

        let actions = event.ordered_actions();
        info!(cursor = %cursor, event = %event.id, actions = actions.len(), "开始播放事件");

        for action in &actions {
            let node = if action.is_spell() {
                None
            } else {
                resolve_token_node(self.scene.as_ref(), container, &action.token_id)
            };

            self.animate_action(action, node, cursor).await?;

            if let Err(e) = self.timeline.set_action_executed(&action.id, true) {
                warn!(action = %action.id, error = %e, "无法标记行动已执行");
            }
        }

        if let Err(e) = self.timeline.set_event_executed(&event.id, true) {
            warn!(event = %event.id, error = %e, "无法标记事件已执行");
        }
        info!(cursor = %cursor, event = %event.id, "事件播放完成");
        Ok(())
    }

    async fn animate_action(
        &self,
        action: &Action,
        node: Option<NodeId>,
        cursor: Cursor,
    ) -> Result<(), PlaybackError> {
        debug!(action = %action, "播放行动");

        match (&action.data, node) {
            (ActionData::Spell(spell), _) => self.animate_spell(action, spell, cursor).await,
            (ActionData::Move(movement), Some(node)) => {
                self.animate_move(action, movement, node).await
            }
            (ActionData::Appear(appear), Some(node)) => {
                self.animate_appear(action, appear, node).await
            }
            (ActionData::Disappear(disappear), Some(node)) => {
                self.animate_disappear(action, disappear, node).await
            }
            (_, None) => {
                debug!(token = %action.token_id, "未找到 token 节点，跳过行动");
                Ok(())
            }
        }
    }

    /// 逐帧运行补间
    ///
    /// 开始时同步采样一次（进度 0），之后每帧采样，直到到达终点。
    async fn run_tween(
        &self,
        duration: f64,
        easing: EasingFunction,
        mut apply: impl FnMut(Sample),
    ) -> Result<(), PlaybackError> {
        let started_at = self.pending.now();
        let tween = Tween::new(started_at, duration, easing);

        let first = tween.sample(started_at);
        apply(first);
        if first.finished {
            return Ok(());
        }

        loop {
            let now = self.pending.next_frame().await?;
            let sample = tween.sample(now);
            apply(sample);
            if sample.finished {
                return Ok(());
            }
        }
    }
}
