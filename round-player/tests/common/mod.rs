//! 集成测试共用的测试环境

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use round_player::{
    FrameLoopScheduler, NodeId, PlaybackConfig, PlaybackError, PlaybackPorts, ProgressBoard,
    ProgressTracker, RoundAnimator, SceneGraph, SceneTree,
};
use tabletop_model::{MapObject, MapObjectStore, MemoryMapStore, MemoryTimeline, Point, Round};

/// 记录调用顺序的进度跟踪器
#[derive(Default)]
pub struct Recorder {
    pub log: RefCell<Vec<String>>,
    pub board: ProgressBoard,
}

impl Recorder {
    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl ProgressTracker for Recorder {
    fn start_animation(&self, token_id: &str, from: Point, to: Point) {
        self.log
            .borrow_mut()
            .push(format!("start {} {} -> {}", token_id, from, to));
        self.board.start_animation(token_id, from, to);
    }

    fn update_progress(&self, token_id: &str, progress: f32) {
        self.board.update_progress(token_id, progress);
    }

    fn end_animation(&self, token_id: &str) {
        self.log.borrow_mut().push(format!("end {}", token_id));
        self.board.end_animation(token_id);
    }
}

/// 播放结果槽
pub type Outcome = Rc<Cell<Option<Result<(), PlaybackError>>>>;

/// 测试环境：内存存储 + 场景树 + 虚拟时钟
pub struct World {
    pub timeline: Rc<MemoryTimeline>,
    pub store: Rc<MemoryMapStore>,
    pub scene: Rc<SceneTree>,
    pub progress: Rc<Recorder>,
    pub scheduler: Rc<FrameLoopScheduler>,
    pub animator: RoundAnimator,
    pub pool: LocalPool,
}

impl World {
    pub fn new(objects: Vec<MapObject>, rounds: Vec<Round>) -> Self {
        Self::with_config(objects, rounds, PlaybackConfig::default())
    }

    pub fn with_config(objects: Vec<MapObject>, rounds: Vec<Round>, config: PlaybackConfig) -> Self {
        let scene = Rc::new(SceneTree::from_objects(&objects, &config.token_layer));
        let store = Rc::new(MemoryMapStore::with_objects(objects).unwrap());
        let timeline = Rc::new(MemoryTimeline::new(rounds));
        let progress = Rc::new(Recorder::default());
        let scheduler = Rc::new(FrameLoopScheduler::new());

        let animator = RoundAnimator::new(
            PlaybackPorts {
                timeline: timeline.clone(),
                store: store.clone(),
                scene: scene.clone(),
                progress: progress.clone(),
                scheduler: scheduler.clone(),
            },
            config,
        );

        Self {
            timeline,
            store,
            scene,
            progress,
            scheduler,
            animator,
            pool: LocalPool::new(),
        }
    }

    /// 启动一个播放 future，并运行到第一次挂起
    pub fn spawn<F>(&mut self, future: F) -> Outcome
    where
        F: Future<Output = Result<(), PlaybackError>> + 'static,
    {
        let outcome: Outcome = Rc::new(Cell::new(None));
        let sink = Rc::clone(&outcome);
        self.pool
            .spawner()
            .spawn_local(async move { sink.set(Some(future.await)) })
            .unwrap();
        self.pool.run_until_stalled();
        outcome
    }

    pub fn run_round(&mut self, event_number: u32) -> Outcome {
        let animator = self.animator.clone();
        self.spawn(async move { animator.run_round(event_number).await })
    }

    /// 推进虚拟时间并运行例程
    pub fn step(&mut self, dt_ms: f64) {
        self.pool.run_until_stalled();
        self.scheduler.advance(dt_ms);
        self.pool.run_until_stalled();
    }

    /// 推进到指定时间
    pub fn step_to(&mut self, now: f64) {
        self.pool.run_until_stalled();
        self.scheduler.advance_to(now);
        self.pool.run_until_stalled();
    }

    /// 按 16ms 一帧推进直到没有待触发的调度
    pub fn finish(&mut self) {
        for _ in 0..10_000 {
            self.pool.run_until_stalled();
            if self.scheduler.is_idle() {
                return;
            }
            self.scheduler.advance(16.0);
        }
        panic!("播放没有结束");
    }

    pub fn node(&self, token_id: &str) -> NodeId {
        let layer = self.scene.find_layer("tokens").unwrap();
        self.scene.find_one(layer, token_id).unwrap()
    }

    pub fn position(&self, id: &str) -> Point {
        self.store.object(id).unwrap().position
    }

    pub fn opacity(&self, id: &str) -> f32 {
        self.store.object(id).unwrap().opacity
    }

    pub fn spell_effects(&self) -> Vec<MapObject> {
        self.store
            .objects()
            .into_iter()
            .filter(|o| o.is_spell_effect())
            .collect()
    }

    pub fn persistent_areas(&self) -> Vec<MapObject> {
        self.store
            .objects()
            .into_iter()
            .filter(|o| o.is_persistent_area())
            .collect()
    }
}
