//! # Frame Loop 模块
//!
//! 由宿主帧循环手动推进的调度器。
//!
//! 宿主每帧调用一次 [`FrameLoopScheduler::advance_to`]；测试则直接推进虚拟时间。
//! 每次推进：
//! 1. 按 (到期时间, 创建顺序) 依次触发所有到期的定时器
//! 2. 触发推进前已请求的所有帧回调

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{FrameCallback, FrameHandle, Scheduler, TimerCallback, TimerHandle};

/// 调度统计（用于验证取消行为）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// 帧请求数
    pub frames_requested: u64,
    /// 已触发的帧回调数
    pub frames_fired: u64,
    /// 已取消的帧请求数
    pub frames_cancelled: u64,
    /// 定时器创建数
    pub timers_set: u64,
    /// 已触发的定时器数
    pub timers_fired: u64,
    /// 已取消的定时器数
    pub timers_cleared: u64,
}

struct PendingTimer {
    due: f64,
    callback: TimerCallback,
}

/// 手动推进的帧循环调度器
pub struct FrameLoopScheduler {
    now: Cell<f64>,
    next_id: Cell<u64>,
    frames: RefCell<BTreeMap<u64, FrameCallback>>,
    timers: RefCell<BTreeMap<u64, PendingTimer>>,
    stats: Cell<SchedulerStats>,
}

impl Default for FrameLoopScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameLoopScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoopScheduler")
            .field("now", &self.now.get())
            .field("frames", &self.frames.borrow().len())
            .field("timers", &self.timers.borrow().len())
            .finish()
    }
}

impl FrameLoopScheduler {
    /// 创建调度器，时钟从 0 开始
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// 创建调度器，时钟从 `now` 开始
    pub fn starting_at(now: f64) -> Self {
        Self {
            now: Cell::new(now),
            next_id: Cell::new(1),
            frames: RefCell::new(BTreeMap::new()),
            timers: RefCell::new(BTreeMap::new()),
            stats: Cell::new(SchedulerStats::default()),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn bump(&self, update: impl FnOnce(&mut SchedulerStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    /// 推进 `dt_ms` 毫秒
    ///
    /// # 返回
    /// 本次触发的回调数
    pub fn advance(&self, dt_ms: f64) -> usize {
        self.advance_to(self.now.get() + dt_ms.max(0.0))
    }

    /// 推进到 `now`（时钟不会倒退）
    ///
    /// # 返回
    /// 本次触发的回调数
    pub fn advance_to(&self, now: f64) -> usize {
        if now > self.now.get() {
            self.now.set(now);
        }
        let now = self.now.get();
        let mut fired = 0;

        // 1. 到期定时器；回调中新建的 0 延迟定时器也在本轮触发
        while let Some(id) = self.next_due_timer(now) {
            let timer = self.timers.borrow_mut().remove(&id);
            if let Some(timer) = timer {
                self.bump(|s| s.timers_fired += 1);
                (timer.callback)();
                fired += 1;
            }
        }

        // 2. 帧回调；回调中请求的新帧留到下一次推进
        let frames = std::mem::take(&mut *self.frames.borrow_mut());
        for (_, callback) in frames {
            self.bump(|s| s.frames_fired += 1);
            callback(now);
            fired += 1;
        }

        fired
    }

    fn next_due_timer(&self, now: f64) -> Option<u64> {
        self.timers
            .borrow()
            .iter()
            .filter(|(_, t)| t.due <= now)
            .min_by(|a, b| a.1.due.total_cmp(&b.1.due).then(a.0.cmp(b.0)))
            .map(|(id, _)| *id)
    }

    /// 最早到期的定时器时间
    pub fn next_due(&self) -> Option<f64> {
        self.timers
            .borrow()
            .values()
            .map(|t| t.due)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// 待触发的帧请求数
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    /// 待触发的定时器数
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// 是否没有任何待触发的回调
    pub fn is_idle(&self) -> bool {
        self.pending_frames() == 0 && self.pending_timers() == 0
    }

    /// 调度统计
    pub fn stats(&self) -> SchedulerStats {
        self.stats.get()
    }
}

impl Scheduler for FrameLoopScheduler {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let id = self.next_id();
        self.frames.borrow_mut().insert(id, callback);
        self.bump(|s| s.frames_requested += 1);
        FrameHandle(id)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        // 先移出再丢弃，回调析构时可能再次访问调度器
        let removed = self.frames.borrow_mut().remove(&handle.0);
        if removed.is_some() {
            self.bump(|s| s.frames_cancelled += 1);
        }
        drop(removed);
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id();
        let due = self.now.get() + delay_ms.max(0.0);
        self.timers
            .borrow_mut()
            .insert(id, PendingTimer { due, callback });
        self.bump(|s| s.timers_set += 1);
        TimerHandle(id)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        let removed = self.timers.borrow_mut().remove(&handle.0);
        if removed.is_some() {
            self.bump(|s| s.timers_cleared += 1);
        }
        drop(removed);
    }
}
