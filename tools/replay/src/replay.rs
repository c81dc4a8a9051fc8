//! 在虚拟时钟上按顺序播放时间线

use std::rc::Rc;

use anyhow::{Context, Result, bail};
use round_player::{PlaybackConfig, PlaybackSession, ProgressBoard, SceneTree};
use serde::Serialize;
use tabletop_model::{MapObject, MapObjectStore, Scenario, sweep_expired};
use tracing::{debug, info, warn};

/// 回放选项
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOptions {
    /// 帧间隔（毫秒）
    pub frame_ms: f64,
    /// 单个事件允许的最大帧数
    pub max_frames: usize,
    /// 覆盖场景中的播放速度
    pub speed: Option<f64>,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            frame_ms: 1000.0 / 60.0,
            max_frames: 100_000,
            speed: None,
        }
    }
}

/// 回放结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    /// 播放的事件数
    pub events_played: usize,
    /// 虚拟时钟总时长（毫秒）
    pub elapsed_ms: f64,
    /// 场景检查警告
    pub warnings: Vec<String>,
    /// 回合推进时移除的持续区域
    pub expired_areas: Vec<String>,
    /// 回合推进时移除的残留特效
    pub stale_effects: Vec<String>,
    /// 最终地图对象
    pub objects: Vec<MapObject>,
}

/// 列出时间线上的所有行动
pub fn list(scenario: &Scenario) -> Vec<String> {
    let mut lines = Vec::new();
    for round in &scenario.rounds {
        for event in &round.events {
            lines.push(format!("R{}E{} ({})", round.number, event.number, event.id));
            for action in event.ordered_actions() {
                lines.push(format!("  {}", action));
            }
        }
    }
    lines
}

/// 播放整个场景
pub fn run(
    scenario: Scenario,
    config: PlaybackConfig,
    options: &ReplayOptions,
) -> Result<ReplayReport> {
    if !options.frame_ms.is_finite() || options.frame_ms <= 0.0 {
        bail!("帧间隔必须为正数，实际为 {}", options.frame_ms);
    }

    let warnings = scenario.check();
    for warning in &warnings {
        warn!(%warning, "场景检查");
    }

    let (store, timeline) = scenario.into_stores().context("无法构建场景存储")?;
    if let Some(speed) = options.speed {
        timeline.set_animation_speed(speed);
    }

    let store = Rc::new(store);
    let timeline = Rc::new(timeline);
    let scene = Rc::new(SceneTree::from_objects(&store.objects(), &config.token_layer));
    let mut session = PlaybackSession::new(
        timeline.clone(),
        store.clone(),
        scene,
        Rc::new(ProgressBoard::new()),
        config,
    );

    let mut report = ReplayReport {
        events_played: 0,
        elapsed_ms: 0.0,
        warnings,
        expired_areas: Vec::new(),
        stale_effects: Vec::new(),
        objects: Vec::new(),
    };

    for cursor in timeline.cursors() {
        // 进入新事件前清理上一事件留下的对象
        let cleanup = sweep_expired(store.as_ref(), cursor);
        if !cleanup.is_empty() {
            debug!(
                cursor = %cursor,
                areas = cleanup.expired_areas.len(),
                effects = cleanup.stale_effects.len(),
                "已清理过期对象"
            );
        }
        report.expired_areas.extend(cleanup.expired_areas);
        report.stale_effects.extend(cleanup.stale_effects);

        info!(cursor = %cursor, "进入事件");
        session.enter(cursor);
        if !session.run_to_idle(options.frame_ms, options.max_frames) {
            bail!("事件 {} 在 {} 帧内没有播放完成", cursor, options.max_frames);
        }
        report.events_played += 1;
    }

    report.elapsed_ms = session.now();
    session.teardown();
    report.objects = store.objects();

    info!(
        events = report.events_played,
        elapsed_ms = report.elapsed_ms,
        "回放完成"
    );
    Ok(report)
}
