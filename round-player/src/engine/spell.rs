//! 施法例程
//!
//! 1. 取施法者的实时位置作为起点
//! 2. 立即创建瞬时特效对象
//! 3. 需要时登记一个定时器，在飞行/爆发结束时生成持续区域
//! 4. 等待动画时长（以及持续区域生成）后删除瞬时特效

use std::rc::Rc;

use futures::channel::oneshot;
use tabletop_model::{
    Action, Cursor, MapObject, MapObjectStore, ObjectKind, ObjectStyle, PersistentAreaInfo, Point,
    SpellData, SpellEffectInfo,
};
use tracing::{debug, warn};

use super::Inner;
use super::timing::spell_timing;
use crate::error::PlaybackError;

/// 持续区域默认透明度
const DEFAULT_AREA_OPACITY: f32 = 0.3;

impl Inner {
    fn next_effect_seq(&self) -> u64 {
        let seq = self.effect_seq.get() + 1;
        self.effect_seq.set(seq);
        seq
    }

    pub(super) async fn animate_spell(
        &self,
        action: &Action,
        spell: &SpellData,
        cursor: Cursor,
    ) -> Result<(), PlaybackError> {
        let actual_from = self
            .store
            .object(&action.token_id)
            .map(|caster| caster.position)
            .unwrap_or(spell.from_position);
        let timing = spell_timing(&self.config.timing, spell, actual_from).scaled(self.speed());
        let seq = self.next_effect_seq();

        let position = if spell.category.is_travelling() {
            actual_from
        } else {
            spell.to_position
        };
        let effect_id = format!("spell-effect-{}-{}", action.id, seq);
        let effect = MapObject {
            id: effect_id.clone(),
            kind: ObjectKind::SpellEffect(SpellEffectInfo {
                category: spell.category.clone(),
                from_position: actual_from,
                to_position: spell.to_position,
                color: spell.color.clone(),
                size: spell.size,
                duration: timing.anim_duration,
                action_id: action.id.clone(),
                spell_name: spell.spell_name.clone(),
            }),
            position,
            opacity: 1.0,
            style: ObjectStyle {
                color: Some(spell.color.clone()),
                opacity: None,
                size: Some(spell.size),
            },
            created_round: None,
            created_event: None,
        }
        .stamped(cursor.round, cursor.event);

        debug!(
            effect = %effect_id,
            category = %spell.category,
            from = %actual_from,
            to = %spell.to_position,
            duration = timing.anim_duration,
            "施放法术"
        );
        if let Err(e) = self.store.add_object(effect) {
            warn!(effect = %effect_id, error = %e, "无法创建法术特效");
        }

        let persisted = timing.persist_delay.map(|delay| {
            let area = PendingArea {
                id: format!("persistent-area-{}-{}", action.id, seq),
                spell: spell.clone(),
                cursor,
            };
            let store = Rc::clone(&self.store);
            let (tx, rx) = oneshot::channel();
            debug!(area = %area.id, delay, "登记持续区域");
            self.pending.schedule_after(delay, move || {
                area.create(store.as_ref());
                let _ = tx.send(());
            });
            rx
        });

        self.pending.sleep(timing.anim_duration).await?;

        // 持续区域必须先于特效删除出现
        if let Some(persisted) = persisted {
            persisted.await.map_err(|_| PlaybackError::Cancelled)?;
        }

        self.store.delete_object(&effect_id);
        debug!(effect = %effect_id, "法术特效结束");
        Ok(())
    }
}

/// 等待生成的持续区域
struct PendingArea {
    id: String,
    spell: SpellData,
    cursor: Cursor,
}

impl PendingArea {
    /// 跟随目标时取目标 token 此刻的位置，找不到则退回施法时的目标点
    fn position(&self, store: &dyn MapObjectStore) -> Point {
        if !self.spell.track_target {
            return self.spell.to_position;
        }

        self.spell
            .target_token_id
            .as_deref()
            .and_then(|target| store.object(target))
            .map(|target| target.position)
            .unwrap_or_else(|| {
                debug!(area = %self.id, "跟随目标不存在，使用原目标点");
                self.spell.to_position
            })
    }

    fn create(self, store: &dyn MapObjectStore) {
        let spell = &self.spell;
        let color = spell
            .persist_color
            .clone()
            .unwrap_or_else(|| spell.color.clone());
        let opacity = spell.persist_opacity.unwrap_or(DEFAULT_AREA_OPACITY);
        let radius = spell.area_radius();

        let area = MapObject {
            id: self.id.clone(),
            kind: ObjectKind::PersistentArea(PersistentAreaInfo {
                radius,
                color: color.clone(),
                opacity,
                spell_name: spell.spell_name.clone(),
                lifetime_rounds: spell.persist_duration,
            }),
            position: self.position(store),
            opacity,
            style: ObjectStyle {
                color: Some(color),
                opacity: Some(opacity),
                size: Some(radius),
            },
            created_round: None,
            created_event: None,
        }
        .stamped(self.cursor.round, self.cursor.event);

        debug!(area = %self.id, position = %area.position, rounds = spell.persist_duration, "生成持续区域");
        if let Err(e) = store.add_object(area) {
            warn!(area = %self.id, error = %e, "无法创建持续区域");
        }
    }
}
