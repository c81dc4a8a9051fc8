//! # Cleanup 模块
//!
//! 回合推进时的对象清理。
//!
//! 播放引擎只负责创建持续区域，不负责其过期。这里按游标清理：
//! - 持续区域：`created_round + lifetime_rounds <= cursor.round` 时过期
//! - 残留的法术特效：创建于当前游标之前的事件
//! - 回退游标时，创建于游标之后的特效与区域一并移除

use crate::map_object::{MapObject, MapObjectStore, ObjectKind};
use crate::timeline::Cursor;

/// 清理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// 被移除的持续区域
    pub expired_areas: Vec<String>,
    /// 被移除的法术特效
    pub stale_effects: Vec<String>,
}

impl CleanupReport {
    /// 是否没有移除任何对象
    pub fn is_empty(&self) -> bool {
        self.expired_areas.is_empty() && self.stale_effects.is_empty()
    }
}

/// 对象创建时的游标（没有时间戳的对象不参与清理）
fn created_at(object: &MapObject) -> Option<Cursor> {
    Some(Cursor::new(object.created_round?, object.created_event?))
}

fn is_after(a: Cursor, b: Cursor) -> bool {
    (a.round, a.event) > (b.round, b.event)
}

/// 按当前游标清理过期对象
pub fn sweep_expired(store: &dyn MapObjectStore, cursor: Cursor) -> CleanupReport {
    let mut report = CleanupReport::default();

    for object in store.objects() {
        let Some(created) = created_at(&object) else {
            continue;
        };

        match &object.kind {
            ObjectKind::PersistentArea(area) => {
                let expired = created.round.saturating_add(area.lifetime_rounds) <= cursor.round;
                if expired || is_after(created, cursor) {
                    store.delete_object(&object.id);
                    report.expired_areas.push(object.id);
                }
            }
            ObjectKind::SpellEffect(_) => {
                if created != cursor {
                    store.delete_object(&object.id);
                    report.stale_effects.push(object.id);
                }
            }
            ObjectKind::Token { .. } | ObjectKind::Shape => {}
        }
    }

    report
}
