//! # Timing 模块
//!
//! 法术动画时长与持续区域生成时机的推导。

use tabletop_model::{Point, SpellCategory, SpellData};

use crate::config::SpellTimingConfig;

/// 法术时间安排（毫秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpellTiming {
    /// 瞬时特效的存在时长
    pub anim_duration: f64,
    /// 持续区域在施法后多久生成（不留下持续区域时为 `None`）
    pub persist_delay: Option<f64>,
}

impl SpellTiming {
    /// 按播放速度换算
    pub fn scaled(self, speed: f64) -> Self {
        Self {
            anim_duration: self.anim_duration / speed,
            persist_delay: self.persist_delay.map(|d| d / speed),
        }
    }
}

/// 弹道飞行时间（毫秒）
///
/// 速度非正或非有限时视为瞬间到达。
pub fn travel_time(from: Point, to: Point, projectile_speed: f32) -> f64 {
    if !projectile_speed.is_finite() || projectile_speed <= 0.0 {
        return 0.0;
    }
    f64::from(from.distance_to(to)) / f64::from(projectile_speed) * 1000.0
}

/// 计算法术的时间安排（未按播放速度换算）
///
/// `actual_from` 是施法者的实时位置，飞行类法术据此计算距离。
pub fn spell_timing(config: &SpellTimingConfig, spell: &SpellData, actual_from: Point) -> SpellTiming {
    let travel = || travel_time(actual_from, spell.to_position, spell.projectile_speed);

    let anim_duration = match &spell.category {
        SpellCategory::Projectile => travel() + config.projectile_buffer_ms,
        SpellCategory::ProjectileBurst => travel() + config.projectile_burst_buffer_ms,
        SpellCategory::Burst => config.burst_ms,
        SpellCategory::Ray => config.ray_ms,
        SpellCategory::Area => spell.duration.unwrap_or(config.area_default_ms),
        SpellCategory::Other(_) => spell.duration.unwrap_or(config.fallback_ms),
    };

    let persist_delay = if spell.persists() {
        match spell.category {
            // 区域立即由持续区域接管
            SpellCategory::Area => Some(0.0),
            // 飞行 + 落点爆发结束后
            _ => Some(travel() + config.projectile_burst_buffer_ms),
        }
    } else {
        None
    };

    SpellTiming {
        anim_duration,
        persist_delay,
    }
}
