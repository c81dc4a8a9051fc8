//! # Pending 模块
//!
//! 未完成调度的登记表，以及基于它的等待原语。
//!
//! 例程发出的每个帧请求和定时器都在调度时登记、在触发时注销。
//! [`PendingRegistry::stop_all`] 通过调度器取消所有仍在登记中的句柄：
//! 回调被丢弃后，等待中的 future 以 [`PlaybackError::Cancelled`] 结束。

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use futures::channel::oneshot;
use tracing::trace;

use crate::error::PlaybackError;
use crate::scheduler::{FrameHandle, Scheduler, TimerHandle};

/// 未完成调度登记表
#[derive(Debug, Default)]
pub struct PendingRegistry {
    frames: RefCell<HashSet<FrameHandle>>,
    timers: RefCell<HashSet<TimerHandle>>,
}

impl PendingRegistry {
    /// 创建空登记表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记帧请求
    pub fn track_frame(&self, handle: FrameHandle) {
        self.frames.borrow_mut().insert(handle);
    }

    /// 注销帧请求
    pub fn release_frame(&self, handle: FrameHandle) {
        self.frames.borrow_mut().remove(&handle);
    }

    /// 登记定时器
    pub fn track_timer(&self, handle: TimerHandle) {
        self.timers.borrow_mut().insert(handle);
    }

    /// 注销定时器
    pub fn release_timer(&self, handle: TimerHandle) {
        self.timers.borrow_mut().remove(&handle);
    }

    /// 登记中的帧请求数
    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    /// 登记中的定时器数
    pub fn timer_count(&self) -> usize {
        self.timers.borrow().len()
    }

    /// 是否没有任何登记
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0 && self.timer_count() == 0
    }

    /// 取消所有登记中的句柄并清空登记表
    ///
    /// # 返回
    /// 被取消的句柄数
    pub fn stop_all(&self, scheduler: &dyn Scheduler) -> usize {
        // 先取出再取消：取消会丢弃回调，回调析构时不能持有借用
        let frames: Vec<FrameHandle> = self.frames.borrow_mut().drain().collect();
        let timers: Vec<TimerHandle> = self.timers.borrow_mut().drain().collect();

        for handle in &frames {
            scheduler.cancel_frame(*handle);
        }
        for handle in &timers {
            scheduler.clear_timeout(*handle);
        }

        frames.len() + timers.len()
    }
}

/// 登记式等待原语
///
/// 所有帧/定时器都经过登记表，保证可以被 `stop_all` 整体取消。
#[derive(Clone)]
pub(crate) struct Pending {
    scheduler: Rc<dyn Scheduler>,
    registry: Rc<PendingRegistry>,
}

impl Pending {
    pub(crate) fn new(scheduler: Rc<dyn Scheduler>, registry: Rc<PendingRegistry>) -> Self {
        Self {
            scheduler,
            registry,
        }
    }

    pub(crate) fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub(crate) fn registry(&self) -> &PendingRegistry {
        &self.registry
    }

    /// 取消所有登记中的调度
    pub(crate) fn stop_all(&self) -> usize {
        self.registry.stop_all(self.scheduler.as_ref())
    }

    /// 等待下一帧，返回帧时间
    pub(crate) async fn next_frame(&self) -> Result<f64, PlaybackError> {
        let (tx, rx) = oneshot::channel();
        let slot: Rc<Cell<Option<FrameHandle>>> = Rc::new(Cell::new(None));

        let registry = Rc::clone(&self.registry);
        let own_handle = Rc::clone(&slot);
        let handle = self.scheduler.request_frame(Box::new(move |now| {
            if let Some(handle) = own_handle.get() {
                registry.release_frame(handle);
            }
            // 接收端已被丢弃时无需处理
            let _ = tx.send(now);
        }));
        slot.set(Some(handle));
        self.registry.track_frame(handle);

        rx.await.map_err(|_| {
            trace!(frame = handle.0, "帧请求被取消");
            PlaybackError::Cancelled
        })
    }

    /// 等待 `delay_ms` 毫秒（非正数立即返回）
    pub(crate) async fn sleep(&self, delay_ms: f64) -> Result<(), PlaybackError> {
        if delay_ms.is_nan() || delay_ms <= 0.0 {
            return Ok(());
        }

        let (tx, rx) = oneshot::channel();
        let handle = self.schedule_after(delay_ms, move || {
            let _ = tx.send(());
        });

        rx.await.map_err(|_| {
            trace!(timer = handle.0, "定时器被取消");
            PlaybackError::Cancelled
        })
    }

    /// 在 `delay_ms` 毫秒后执行 `action`（不等待）
    pub(crate) fn schedule_after(
        &self,
        delay_ms: f64,
        action: impl FnOnce() + 'static,
    ) -> TimerHandle {
        let slot: Rc<Cell<Option<TimerHandle>>> = Rc::new(Cell::new(None));

        let registry = Rc::clone(&self.registry);
        let own_handle = Rc::clone(&slot);
        let handle = self.scheduler.set_timeout(
            delay_ms,
            Box::new(move || {
                if let Some(handle) = own_handle.get() {
                    registry.release_timer(handle);
                }
                action();
            }),
        );
        slot.set(Some(handle));
        self.registry.track_timer(handle);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::FrameLoopScheduler;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;

    fn setup() -> (Rc<FrameLoopScheduler>, Pending) {
        let scheduler = Rc::new(FrameLoopScheduler::new());
        let pending = Pending::new(scheduler.clone(), Rc::new(PendingRegistry::new()));
        (scheduler, pending)
    }

    #[test]
    fn test_next_frame_registers_and_releases() {
        let (scheduler, pending) = setup();
        let mut pool = LocalPool::new();
        let result = Rc::new(Cell::new(None));

        let waiter = pending.clone();
        let sink = Rc::clone(&result);
        pool.spawner()
            .spawn_local(async move { sink.set(Some(waiter.next_frame().await)) })
            .unwrap();

        pool.run_until_stalled();
        assert_eq!(pending.registry().frame_count(), 1);

        scheduler.advance(16.0);
        pool.run_until_stalled();
        assert_eq!(result.get(), Some(Ok(16.0)));
        assert!(pending.registry().is_empty());
    }

    #[test]
    fn test_sleep_resolves_at_due_time() {
        let (scheduler, pending) = setup();
        let mut pool = LocalPool::new();
        let done = Rc::new(Cell::new(false));

        let waiter = pending.clone();
        let flag = Rc::clone(&done);
        pool.spawner()
            .spawn_local(async move {
                waiter.sleep(100.0).await.unwrap();
                flag.set(true);
            })
            .unwrap();

        pool.run_until_stalled();
        scheduler.advance(99.0);
        pool.run_until_stalled();
        assert!(!done.get());

        scheduler.advance(1.0);
        pool.run_until_stalled();
        assert!(done.get());
        assert_eq!(pending.registry().timer_count(), 0);
    }

    #[test]
    fn test_stop_all_cancels_waiters() {
        let (scheduler, pending) = setup();
        let mut pool = LocalPool::new();
        let result = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..2 {
            let waiter = pending.clone();
            let sink = Rc::clone(&result);
            pool.spawner()
                .spawn_local(async move {
                    let r = waiter.next_frame().await.map(|_| ());
                    sink.borrow_mut().push(r);
                })
                .unwrap();
        }
        let waiter = pending.clone();
        let sink = Rc::clone(&result);
        pool.spawner()
            .spawn_local(async move {
                let r = waiter.sleep(500.0).await;
                sink.borrow_mut().push(r);
            })
            .unwrap();

        pool.run_until_stalled();
        assert_eq!(pending.stop_all(), 3);
        pool.run_until_stalled();

        assert_eq!(*result.borrow(), vec![Err(PlaybackError::Cancelled); 3]);
        assert!(pending.registry().is_empty());
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.advance(1000.0), 0);
    }

    #[test]
    fn test_non_positive_sleep_is_immediate() {
        let (scheduler, pending) = setup();
        let mut pool = LocalPool::new();
        let done = Rc::new(Cell::new(false));

        let flag = Rc::clone(&done);
        pool.spawner()
            .spawn_local(async move {
                pending.sleep(0.0).await.unwrap();
                pending.sleep(-5.0).await.unwrap();
                flag.set(true);
            })
            .unwrap();

        pool.run_until_stalled();
        assert!(done.get());
        assert_eq!(scheduler.stats().timers_set, 0);
    }
}
