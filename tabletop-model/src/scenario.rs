//! # Scenario 模块
//!
//! 一份完整的战斗场景：地图对象 + 时间线。
//!
//! 仅是数据模型的 serde 映射，用于无头回放和测试夹具。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::map_object::{MapObject, MemoryMapStore};
use crate::timeline::{MemoryTimeline, Round};

/// 场景
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// 地图对象
    #[serde(default)]
    pub objects: Vec<MapObject>,
    /// 回合列表
    #[serde(default)]
    pub rounds: Vec<Round>,
    /// 播放速度倍率
    #[serde(default = "default_speed")]
    pub animation_speed: f64,
}

fn default_speed() -> f64 {
    1.0
}

impl Scenario {
    /// 从 JSON 文本解析
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::ScenarioParse {
            message: e.to_string(),
        })
    }

    /// 检查场景一致性，返回警告列表（空列表表示没有问题）
    ///
    /// 检查项：
    /// - 对象 ID 重复
    /// - 事件/行动 ID 重复
    /// - 非法术行动引用了不存在的 token
    /// - 跟随目标引用了不存在的 token
    pub fn check(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut object_ids = HashSet::new();
        for object in &self.objects {
            if !object_ids.insert(object.id.as_str()) {
                warnings.push(format!("对象 ID 重复: {}", object.id));
            }
        }

        let mut event_ids = HashSet::new();
        let mut action_ids = HashSet::new();
        for round in &self.rounds {
            for event in &round.events {
                if !event_ids.insert(event.id.as_str()) {
                    warnings.push(format!("事件 ID 重复: {}", event.id));
                }
                for action in &event.actions {
                    if !action_ids.insert(action.id.as_str()) {
                        warnings.push(format!("行动 ID 重复: {}", action.id));
                    }
                    if !action.is_spell() && !object_ids.contains(action.token_id.as_str()) {
                        warnings.push(format!(
                            "R{}E{} 行动 {} 引用了不存在的 token: {}",
                            round.number, event.number, action.id, action.token_id
                        ));
                    }
                    if let crate::action::ActionData::Spell(spell) = &action.data {
                        if let Some(target) = spell.target_token_id.as_deref() {
                            if spell.track_target && !object_ids.contains(target) {
                                warnings.push(format!(
                                    "行动 {} 跟随的目标不存在: {}",
                                    action.id, target
                                ));
                            }
                        }
                    }
                }
            }
        }

        warnings
    }

    /// 转换为内存存储
    pub fn into_stores(self) -> Result<(MemoryMapStore, MemoryTimeline), ModelError> {
        let store = MemoryMapStore::with_objects(self.objects)?;
        let timeline = MemoryTimeline::new(self.rounds);
        timeline.set_animation_speed(self.animation_speed);
        Ok((store, timeline))
    }
}
