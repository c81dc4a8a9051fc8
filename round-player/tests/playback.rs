//! # 回合播放集成测试
//!
//! 测试 时间线 → RoundAnimator → 对象存储/场景 的播放链路，
//! 全部使用虚拟时钟驱动。

mod common;

use common::World;
use round_player::{
    PlaybackConfig, PlaybackError, PlaybackSession, ProgressBoard, SceneGraph, SceneTree,
};
use std::rc::Rc;
use tabletop_model::{
    Action, ActionData, AppearData, Cursor, DisappearData, Event, MapObject, MapObjectStore,
    MemoryMapStore, MemoryTimeline, MoveData, MoveEasing, ObjectKind, ObjectStyle, Point, Round,
    SpellCategory, SpellData, TimelineStore,
};

fn move_to(id: &str, token: &str, to: Point, duration: f64) -> Action {
    Action::new(id, token, ActionData::Move(MoveData::new(to, duration)))
}

fn fade_out(id: &str, token: &str, duration: f64) -> Action {
    Action::new(
        id,
        token,
        ActionData::Disappear(DisappearData {
            position: None,
            fade_out: true,
            duration,
        }),
    )
}

fn cast(id: &str, caster: &str, spell: SpellData) -> Action {
    Action::new(id, caster, ActionData::Spell(spell))
}

fn one_event(actions: Vec<Action>) -> Vec<Round> {
    let mut event = Event::new("e1", 1);
    event.actions = actions;
    vec![Round::new(1).with_event(event)]
}

/// 同一事件内按 order 串行执行，order 相同时保持原始顺序
#[test]
fn test_actions_run_sequentially_in_order() {
    let objects = vec![
        MapObject::token("t1", "Fighter", Point::zero()),
        MapObject::token("t2", "Rogue", Point::new(0.0, 10.0)),
    ];
    let rounds = one_event(vec![
        move_to("a3", "t1", Point::new(20.0, 0.0), 100.0).with_order(1),
        move_to("a1", "t1", Point::new(10.0, 0.0), 100.0),
        move_to("a2", "t2", Point::new(10.0, 10.0), 100.0),
    ]);
    let mut world = World::new(objects, rounds);

    let outcome = world.run_round(1);
    // 同一时刻只有一个移动在进行
    for _ in 0..40 {
        world.step(16.0);
        assert!(world.progress.board.active_count() <= 1);
    }

    assert_eq!(outcome.get(), Some(Ok(())));
    assert_eq!(
        world.progress.entries(),
        vec![
            "start t1 (0, 0) -> (10, 0)",
            "end t1",
            "start t2 (0, 10) -> (10, 10)",
            "end t2",
            "start t1 (10, 0) -> (20, 0)",
            "end t1",
        ]
    );

    let event = world.timeline.event(1, 1).unwrap();
    assert!(event.executed);
    assert!(event.actions.iter().all(|a| a.executed));
}

/// 移动在起点和终点精确，不受缓动影响
#[test]
fn test_move_boundaries_are_exact() {
    for easing in [MoveEasing::Linear, MoveEasing::Smooth] {
        let objects = vec![MapObject::token("t1", "Fighter", Point::zero())];
        let mut world = World::new(objects, one_event(vec![]));
        let node = world.node("t1");

        let data = MoveData::new(Point::new(100.0, 0.0), 500.0).with_easing(easing);
        let action = Action::new("a1", "t1", ActionData::Move(data));
        let animator = world.animator.clone();
        let outcome = world.spawn(async move { animator.animate_action(&action, Some(node)).await });

        // 进度 0
        assert_eq!(world.position("t1"), Point::zero());
        assert_eq!(world.progress.board.get("t1").unwrap().progress, 0.0);

        let mut last = 0.0;
        while outcome.get().is_none() {
            world.step(16.0);
            let x = world.position("t1").x;
            assert!((0.0..=100.0).contains(&x));
            assert!(x >= last);
            last = x;
        }

        assert_eq!(outcome.get(), Some(Ok(())));
        assert_eq!(world.position("t1"), Point::new(100.0, 0.0));
        assert_eq!(world.scene.position(node), Some(Point::new(100.0, 0.0)));
        assert!(!world.progress.board.is_animating("t1"));
    }
}

/// 平滑缓动在一半时间处正好走到一半
#[test]
fn test_smooth_move_midpoint() {
    let objects = vec![MapObject::token("t1", "Fighter", Point::zero())];
    let mut world = World::new(objects, one_event(vec![]));
    let node = world.node("t1");

    let action = move_to("a1", "t1", Point::new(100.0, 0.0), 500.0);
    let animator = world.animator.clone();
    world.spawn(async move { animator.animate_action(&action, Some(node)).await });

    world.step_to(125.0);
    assert!(world.position("t1").x < 25.0);
    world.step_to(250.0);
    assert!((world.position("t1").x - 50.0).abs() < 1e-3);
    assert_eq!(world.progress.board.get("t1").unwrap().progress, 0.5);
}

/// 第二次移动从实时位置出发，而不是编辑时记录的起点
#[test]
fn test_chained_moves_start_from_live_position() {
    let objects = vec![MapObject::token("t1", "Fighter", Point::zero())];
    let stale = Action::new(
        "b",
        "t1",
        ActionData::Move(
            MoveData::new(Point::new(100.0, 50.0), 100.0)
                .with_from(Point::zero())
                .with_easing(MoveEasing::Linear),
        ),
    )
    .with_order(1);
    let rounds = one_event(vec![move_to("a", "t1", Point::new(50.0, 50.0), 100.0), stale]);
    let mut world = World::new(objects, rounds);

    world.run_round(1);
    world.finish();

    assert_eq!(
        world.progress.entries(),
        vec![
            "start t1 (0, 0) -> (50, 50)",
            "end t1",
            "start t1 (50, 50) -> (100, 50)",
            "end t1",
        ]
    );
    assert_eq!(world.position("t1"), Point::new(100.0, 50.0));
}

/// 弹道时长由距离和速度决定，而不是行动声明的时长
#[test]
fn test_projectile_duration_from_travel_time() {
    let objects = vec![MapObject::token("wizard", "Wizard", Point::zero())];
    let mut spell = SpellData::new(SpellCategory::Projectile, Point::zero(), Point::new(300.0, 0.0));
    spell.projectile_speed = 500.0;
    spell.duration = Some(5000.0);
    let mut world = World::new(objects, one_event(vec![cast("s1", "wizard", spell)]));

    let outcome = world.run_round(1);

    let effects = world.spell_effects();
    assert_eq!(effects.len(), 1);
    let effect = &effects[0];
    assert_eq!(effect.position, Point::zero());
    assert_eq!(effect.created_round, Some(1));
    assert_eq!(effect.created_event, Some(1));
    let ObjectKind::SpellEffect(info) = &effect.kind else {
        panic!("应为法术特效");
    };
    assert!((info.duration - 800.0).abs() < 1e-6);

    world.step_to(790.0);
    assert_eq!(world.spell_effects().len(), 1);
    assert_eq!(outcome.get(), None);

    world.step_to(810.0);
    assert!(world.spell_effects().is_empty());
    assert_eq!(outcome.get(), Some(Ok(())));
    assert!(world.timeline.event(1, 1).unwrap().executed);
}

/// 施法者移动过后，弹道从新位置出发
#[test]
fn test_spell_uses_live_caster_position() {
    let objects = vec![MapObject::token("wizard", "Wizard", Point::zero())];
    let spell = SpellData::new(SpellCategory::Projectile, Point::zero(), Point::new(300.0, 0.0));
    let rounds = one_event(vec![
        move_to("m", "wizard", Point::new(200.0, 0.0), 100.0),
        cast("s", "wizard", spell).with_order(1),
    ]);
    let mut world = World::new(objects, rounds);

    world.run_round(1);
    // 移动在 112ms 的帧结束，施法随即开始
    world.step_to(112.0);
    let effects = world.spell_effects();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].position, Point::new(200.0, 0.0));
    let ObjectKind::SpellEffect(info) = &effects[0].kind else {
        panic!("应为法术特效");
    };
    assert!((info.duration - 400.0).abs() < 1e-6);
}

/// 播放速度在例程开始时读取一次
#[test]
fn test_speed_scales_spell_duration() {
    let objects = vec![MapObject::token("wizard", "Wizard", Point::zero())];
    let spell = SpellData::new(SpellCategory::Ray, Point::zero(), Point::new(50.0, 0.0));
    let mut world = World::new(objects, one_event(vec![cast("s", "wizard", spell)]));
    world.timeline.set_animation_speed(2.0);

    let outcome = world.run_round(1);
    // 中途调整速度不影响已开始的例程
    world.timeline.set_animation_speed(0.5);

    world.step_to(390.0);
    assert_eq!(outcome.get(), None);
    world.step_to(400.0);
    assert_eq!(outcome.get(), Some(Ok(())));
}

/// 持续区域跟随目标 token 的实时位置
#[test]
fn test_persistent_area_tracks_moved_target() {
    let objects = vec![
        MapObject::token("wizard", "Wizard", Point::zero()),
        MapObject::token("ogre", "Ogre", Point::new(200.0, 0.0)),
    ];
    let mut spell = SpellData::new(SpellCategory::Area, Point::zero(), Point::new(200.0, 0.0));
    spell.persist_duration = 2;
    spell.track_target = true;
    spell.target_token_id = Some("ogre".to_string());
    spell.spell_name = "Cloudkill".to_string();
    let mut world = World::new(objects, one_event(vec![cast("s", "wizard", spell)]));

    let outcome = world.run_round(1);
    // 特效在目标点展开
    assert_eq!(world.spell_effects()[0].position, Point::new(200.0, 0.0));
    assert!(world.persistent_areas().is_empty());

    // 持续区域生成前目标移动
    world.store.update_object_position("ogre", Point::new(250.0, 40.0));
    world.step(1.0);

    let areas = world.persistent_areas();
    assert_eq!(areas.len(), 1);
    let area = &areas[0];
    assert_eq!(area.position, Point::new(250.0, 40.0));
    assert_eq!(area.created_round, Some(1));
    let ObjectKind::PersistentArea(info) = &area.kind else {
        panic!("应为持续区域");
    };
    assert_eq!(info.lifetime_rounds, 2);
    assert_eq!(info.spell_name, "Cloudkill");

    world.finish();
    assert_eq!(outcome.get(), Some(Ok(())));
    assert!(world.spell_effects().is_empty());
    assert_eq!(world.persistent_areas().len(), 1);
}

/// 跟随目标不存在时使用原目标点
#[test]
fn test_persistent_area_falls_back_to_target_point() {
    let objects = vec![MapObject::token("wizard", "Wizard", Point::zero())];
    let mut spell = SpellData::new(SpellCategory::Area, Point::zero(), Point::new(80.0, 80.0));
    spell.persist_duration = 1;
    spell.track_target = true;
    spell.target_token_id = Some("ghost".to_string());
    let mut world = World::new(objects, one_event(vec![cast("s", "wizard", spell)]));

    world.run_round(1);
    world.finish();

    let areas = world.persistent_areas();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].position, Point::new(80.0, 80.0));
}

/// 展开时长为 0 的区域法术：事件完成前持续区域已经生成
#[test]
fn test_zero_duration_area_persists_before_event_completes() {
    let objects = vec![MapObject::token("wizard", "Wizard", Point::zero())];
    let mut spell = SpellData::new(SpellCategory::Area, Point::zero(), Point::new(40.0, 40.0));
    spell.duration = Some(0.0);
    spell.persist_duration = 1;
    let mut world = World::new(objects, one_event(vec![cast("s", "wizard", spell)]));

    let outcome = world.run_round(1);
    assert_eq!(outcome.get(), None);
    assert!(!world.timeline.event(1, 1).unwrap().executed);
    assert_eq!(world.animator.pending_timers(), 1);

    world.step(1.0);
    assert_eq!(outcome.get(), Some(Ok(())));
    assert_eq!(world.persistent_areas().len(), 1);
    assert!(world.spell_effects().is_empty());
    assert!(world.timeline.event(1, 1).unwrap().executed);

    // 停止后区域仍然保留
    assert_eq!(world.animator.stop_all(), 0);
    assert_eq!(world.persistent_areas().len(), 1);
}

/// 持续区域生成前被停止：事件不会被标记完成
#[test]
fn test_zero_duration_area_cancelled_before_persisting() {
    let objects = vec![MapObject::token("wizard", "Wizard", Point::zero())];
    let mut spell = SpellData::new(SpellCategory::Area, Point::zero(), Point::new(40.0, 40.0));
    spell.duration = Some(0.0);
    spell.persist_duration = 1;
    let mut world = World::new(objects, one_event(vec![cast("s", "wizard", spell)]));

    let outcome = world.run_round(1);
    assert_eq!(world.animator.stop_all(), 1);
    world.step(1.0);

    assert_eq!(outcome.get(), Some(Err(PlaybackError::Cancelled)));
    assert!(world.persistent_areas().is_empty());
    assert!(!world.timeline.event(1, 1).unwrap().executed);
}

/// 弹道爆发在飞行 + 爆发结束时生成持续区域
#[test]
fn test_projectile_burst_persists_after_travel() {
    let objects = vec![MapObject::token("wizard", "Wizard", Point::zero())];
    let mut spell = SpellData::new(
        SpellCategory::ProjectileBurst,
        Point::zero(),
        Point::new(500.0, 0.0),
    );
    spell.persist_duration = 3;
    spell.persist_color = Some("#00ff00".to_string());
    let mut world = World::new(objects, one_event(vec![cast("s", "wizard", spell)]));

    let outcome = world.run_round(1);
    // 500px / 500px/s = 1000ms，加 500ms 爆发
    world.step_to(1400.0);
    assert!(world.persistent_areas().is_empty());
    assert_eq!(world.spell_effects().len(), 1);

    world.step_to(1500.0);
    assert_eq!(outcome.get(), Some(Ok(())));
    assert!(world.spell_effects().is_empty());
    let areas = world.persistent_areas();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].style.color.as_deref(), Some("#00ff00"));
}

/// 非持续类别不会留下区域
#[test]
fn test_burst_leaves_nothing_behind() {
    let objects = vec![MapObject::token("wizard", "Wizard", Point::zero())];
    let mut spell = SpellData::new(SpellCategory::Burst, Point::zero(), Point::new(10.0, 10.0));
    spell.persist_duration = 4;
    let mut world = World::new(objects, one_event(vec![cast("s", "wizard", spell)]));

    world.run_round(1);
    assert_eq!(world.spell_effects()[0].position, Point::new(10.0, 10.0));
    world.finish();

    assert!(world.spell_effects().is_empty());
    assert!(world.persistent_areas().is_empty());
    assert_eq!(world.scheduler.stats().timers_set, 1);
}

/// 出现：先同步隐藏并移动，再淡入到常规透明度
#[test]
fn test_appear_fades_to_resting_opacity() {
    let token = MapObject::token("t1", "Ghost", Point::zero()).with_style(ObjectStyle {
        opacity: Some(0.8),
        ..ObjectStyle::default()
    });
    let appear = Action::new(
        "a",
        "t1",
        ActionData::Appear(AppearData {
            position: Point::new(30.0, 30.0),
            fade_in: true,
            duration: 100.0,
        }),
    );
    let mut world = World::new(vec![token], one_event(vec![appear]));
    let node = world.node("t1");

    world.run_round(1);
    // 第一帧之前
    assert_eq!(world.scene.opacity(node), Some(0.0));
    assert_eq!(world.scene.position(node), Some(Point::new(30.0, 30.0)));
    assert_eq!(world.position("t1"), Point::new(30.0, 30.0));

    world.step_to(50.0);
    let mid = world.scene.opacity(node).unwrap();
    assert!(mid > 0.0 && mid < 0.8);

    world.finish();
    assert_eq!(world.scene.opacity(node), Some(0.8));
    assert_eq!(world.opacity("t1"), 0.8);
}

/// 不淡入时立即出现
#[test]
fn test_appear_without_fade_is_immediate() {
    let appear = Action::new(
        "a",
        "t1",
        ActionData::Appear(AppearData {
            position: Point::new(5.0, 5.0),
            fade_in: false,
            duration: 300.0,
        }),
    );
    let objects = vec![MapObject::token("t1", "Ghost", Point::zero())];
    let mut world = World::new(objects, one_event(vec![appear]));

    let outcome = world.run_round(1);
    assert_eq!(outcome.get(), Some(Ok(())));
    assert_eq!(world.opacity("t1"), 1.0);
    assert_eq!(world.scheduler.stats().frames_requested, 0);
}

/// 消失不删除对象
#[test]
fn test_disappear_keeps_object() {
    let hide = Action::new(
        "d",
        "t1",
        ActionData::Disappear(DisappearData {
            position: None,
            fade_out: false,
            duration: 300.0,
        }),
    );
    let objects = vec![MapObject::token("t1", "Rogue", Point::zero())];
    let mut world = World::new(objects, one_event(vec![hide]));

    world.run_round(1);
    assert_eq!(world.opacity("t1"), 0.0);
    assert!(world.store.object("t1").is_some());
}

/// 缺失的事件、图层、节点都按空操作处理
#[test]
fn test_missing_targets_are_noops() {
    let objects = vec![MapObject::token("t1", "Fighter", Point::zero())];
    let rounds = one_event(vec![move_to("a", "nobody", Point::new(10.0, 0.0), 100.0)]);
    let mut world = World::new(objects.clone(), rounds.clone());

    assert_eq!(world.run_round(7).get(), Some(Ok(())));

    // 找不到 token 节点：跳过行动，事件照常完成
    assert_eq!(world.run_round(1).get(), Some(Ok(())));
    assert!(world.timeline.event(1, 1).unwrap().executed);
    assert_eq!(world.scheduler.stats().frames_requested, 0);

    // 图层不存在：什么都不做
    let config = PlaybackConfig {
        token_layer: "creatures".to_string(),
        ..PlaybackConfig::default()
    };
    let mut world = World::with_config(objects, rounds, config);
    let layer = world.scene.find_layer("creatures").unwrap();
    world.scene.remove(layer);
    assert_eq!(world.run_round(1).get(), Some(Ok(())));
    assert!(!world.timeline.event(1, 1).unwrap().executed);
}

/// 已执行的事件默认不再播放
#[test]
fn test_executed_event_is_skipped_unless_configured() {
    let objects = vec![MapObject::token("t1", "Fighter", Point::zero())];
    let rounds = one_event(vec![move_to("a", "t1", Point::new(10.0, 0.0), 100.0)]);

    let mut world = World::new(objects.clone(), rounds.clone());
    world.timeline.set_event_executed("e1", true).unwrap();
    assert_eq!(world.run_round(1).get(), Some(Ok(())));
    assert_eq!(world.position("t1"), Point::zero());

    let config = PlaybackConfig {
        replay_executed_events: true,
        ..PlaybackConfig::default()
    };
    let mut world = World::with_config(objects, rounds, config);
    world.timeline.set_event_executed("e1", true).unwrap();
    world.run_round(1);
    world.finish();
    assert_eq!(world.position("t1"), Point::new(10.0, 0.0));
}

/// 重播整个回合
#[test]
fn test_replay_round_plays_events_in_order() {
    let objects = vec![MapObject::token("t1", "Fighter", Point::zero())];
    let rounds = vec![
        Round::new(1)
            .with_event(Event::new("e2", 2).with_action(move_to(
                "b",
                "t1",
                Point::new(20.0, 0.0),
                50.0,
            )))
            .with_event(Event::new("e1", 1).with_action(move_to(
                "a",
                "t1",
                Point::new(10.0, 0.0),
                50.0,
            ))),
    ];
    let mut world = World::new(objects, rounds);

    let animator = world.animator.clone();
    let outcome = world.spawn(async move { animator.replay_round(1).await });
    world.finish();

    assert_eq!(outcome.get(), Some(Ok(())));
    assert_eq!(
        world.progress.entries(),
        vec![
            "start t1 (0, 0) -> (10, 0)",
            "end t1",
            "start t1 (10, 0) -> (20, 0)",
            "end t1",
        ]
    );
    assert!(world.timeline.event(1, 1).unwrap().executed);
    assert!(world.timeline.event(1, 2).unwrap().executed);
}

/// 端到端：游标从事件 1 前进到事件 2，移动后淡出
#[test]
fn test_end_to_end_move_then_fade_out() {
    let objects = vec![MapObject::token("t1", "Fighter", Point::zero())];
    let rounds = vec![
        Round::new(1).with_event(Event::new("e1", 1)).with_event(
            Event::new("e2", 2)
                .with_action(move_to("m", "t1", Point::new(40.0, 0.0), 100.0))
                .with_action(fade_out("f", "t1", 100.0).with_order(1)),
        ),
    ];

    let store = Rc::new(MemoryMapStore::with_objects(objects.clone()).unwrap());
    let timeline = Rc::new(MemoryTimeline::new(rounds));
    let scene = Rc::new(SceneTree::from_objects(&objects, "tokens"));
    let mut session = PlaybackSession::new(
        timeline.clone(),
        store.clone(),
        scene,
        Rc::new(ProgressBoard::new()),
        PlaybackConfig::default(),
    );

    assert_eq!(timeline.cursor(), Cursor::new(1, 1));
    session.enter(Cursor::new(1, 2));
    assert!(session.run_to_idle(16.0, 1000));

    let token = store.object("t1").unwrap();
    assert_eq!(token.position, Point::new(40.0, 0.0));
    assert_eq!(token.opacity, 0.0);
    assert!(timeline.event(1, 2).unwrap().executed);
}

/// 直接等待 run_round 的端到端版本
#[test]
fn test_end_to_end_run_round() {
    let objects = vec![MapObject::token("t1", "Fighter", Point::zero())];
    let rounds = vec![
        Round::new(1).with_event(Event::new("e1", 1)).with_event(
            Event::new("e2", 2)
                .with_action(move_to("m", "t1", Point::new(40.0, 0.0), 100.0))
                .with_action(fade_out("f", "t1", 100.0)),
        ),
    ];
    let mut world = World::new(objects, rounds);

    let outcome = world.run_round(2);
    world.finish();

    assert_eq!(outcome.get(), Some(Ok(())));
    assert_eq!(world.position("t1"), Point::new(40.0, 0.0));
    assert_eq!(world.opacity("t1"), 0.0);
    assert!(world.timeline.event(1, 2).unwrap().executed);
}
