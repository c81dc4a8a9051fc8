//! # Map Object 模块
//!
//! 地图上放置的对象（token、形状、法术特效、持续区域）以及对象存储。
//!
//! 对象存储是场景的权威数据源：渲染层根据存储派生场景节点，
//! 播放引擎在动画过程中逐帧写入存储。

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::action::SpellCategory;
use crate::error::ModelError;
use crate::geometry::Point;

/// 地图对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapObject {
    /// 对象 ID
    pub id: String,
    /// 对象类型
    pub kind: ObjectKind,
    /// 当前位置
    pub position: Point,
    /// 当前（可见）透明度，由播放引擎改写
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// 样式
    #[serde(default)]
    pub style: ObjectStyle,
    /// 创建时所在回合（特效/持续区域使用）
    #[serde(default)]
    pub created_round: Option<u32>,
    /// 创建时所在事件
    #[serde(default)]
    pub created_event: Option<u32>,
}

impl MapObject {
    /// 创建 token
    pub fn token(id: impl Into<String>, name: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            kind: ObjectKind::Token { name: name.into() },
            position,
            opacity: default_opacity(),
            style: ObjectStyle::default(),
            created_round: None,
            created_event: None,
        }
    }

    /// 创建普通形状
    pub fn shape(id: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            kind: ObjectKind::Shape,
            position,
            opacity: default_opacity(),
            style: ObjectStyle::default(),
            created_round: None,
            created_event: None,
        }
    }

    /// 设置样式
    pub fn with_style(mut self, style: ObjectStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置创建时的回合/事件
    pub fn stamped(mut self, round: u32, event: u32) -> Self {
        self.created_round = Some(round);
        self.created_event = Some(event);
        self
    }

    /// 是否为 token
    pub fn is_token(&self) -> bool {
        matches!(self.kind, ObjectKind::Token { .. })
    }

    /// 是否为法术特效（瞬时对象）
    pub fn is_spell_effect(&self) -> bool {
        matches!(self.kind, ObjectKind::SpellEffect(_))
    }

    /// 是否为持续区域
    pub fn is_persistent_area(&self) -> bool {
        matches!(self.kind, ObjectKind::PersistentArea(_))
    }

    /// 常规透明度（出现动画的目标值）
    pub fn resting_opacity(&self) -> f32 {
        self.style.opacity.unwrap_or(1.0)
    }
}

/// 对象类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectKind {
    /// 角色 token
    Token {
        /// 显示名称
        #[serde(default)]
        name: String,
    },
    /// 普通形状
    Shape,
    /// 法术特效（瞬时）
    SpellEffect(SpellEffectInfo),
    /// 持续区域
    PersistentArea(PersistentAreaInfo),
}

/// 对象样式
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStyle {
    /// 颜色
    #[serde(default)]
    pub color: Option<String>,
    /// 常规透明度（缺省为 1.0）
    #[serde(default)]
    pub opacity: Option<f32>,
    /// 尺寸
    #[serde(default)]
    pub size: Option<f32>,
}

/// 法术特效信息，供渲染层绘制飞行/爆发动画
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellEffectInfo {
    /// 类别
    pub category: SpellCategory,
    /// 起点（实际施法位置）
    pub from_position: Point,
    /// 终点
    pub to_position: Point,
    /// 颜色
    pub color: String,
    /// 尺寸
    pub size: f32,
    /// 动画时长（毫秒，已按播放速度换算）
    pub duration: f64,
    /// 来源行动
    pub action_id: String,
    /// 法术名称
    #[serde(default)]
    pub spell_name: String,
}

/// 持续区域信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentAreaInfo {
    /// 半径
    pub radius: f32,
    /// 颜色
    pub color: String,
    /// 透明度
    pub opacity: f32,
    /// 法术名称
    #[serde(default)]
    pub spell_name: String,
    /// 存在时长（回合）
    pub lifetime_rounds: u32,
}

fn default_opacity() -> f32 {
    1.0
}

/// 地图对象存储接口
///
/// 所有写入同步生效，立即对后续读取可见。
pub trait MapObjectStore {
    /// 所有对象的快照
    fn objects(&self) -> Vec<MapObject>;

    /// 按 ID 获取对象
    fn object(&self, id: &str) -> Option<MapObject>;

    /// 添加对象（ID 重复时报错）
    fn add_object(&self, object: MapObject) -> Result<(), ModelError>;

    /// 更新位置；对象不存在时返回 `false`
    fn update_object_position(&self, id: &str, position: Point) -> bool;

    /// 更新可见透明度；对象不存在时返回 `false`
    fn update_object_opacity(&self, id: &str, opacity: f32) -> bool;

    /// 删除对象，返回被删除的对象
    fn delete_object(&self, id: &str) -> Option<MapObject>;
}

/// 内存对象存储（保持插入顺序）
#[derive(Debug, Default)]
pub struct MemoryMapStore {
    objects: RefCell<Vec<MapObject>>,
}

impl MemoryMapStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 从对象列表创建
    pub fn with_objects(objects: Vec<MapObject>) -> Result<Self, ModelError> {
        let store = Self::new();
        for object in objects {
            store.add_object(object)?;
        }
        Ok(store)
    }

    /// 对象数量
    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }
}

impl MapObjectStore for MemoryMapStore {
    fn objects(&self) -> Vec<MapObject> {
        self.objects.borrow().clone()
    }

    fn object(&self, id: &str) -> Option<MapObject> {
        self.objects.borrow().iter().find(|o| o.id == id).cloned()
    }

    fn add_object(&self, object: MapObject) -> Result<(), ModelError> {
        let mut objects = self.objects.borrow_mut();
        if objects.iter().any(|o| o.id == object.id) {
            return Err(ModelError::DuplicateObject { id: object.id });
        }
        objects.push(object);
        Ok(())
    }

    fn update_object_position(&self, id: &str, position: Point) -> bool {
        match self.objects.borrow_mut().iter_mut().find(|o| o.id == id) {
            Some(object) => {
                object.position = position;
                true
            }
            None => false,
        }
    }

    fn update_object_opacity(&self, id: &str, opacity: f32) -> bool {
        match self.objects.borrow_mut().iter_mut().find(|o| o.id == id) {
            Some(object) => {
                object.opacity = opacity;
                true
            }
            None => false,
        }
    }

    fn delete_object(&self, id: &str) -> Option<MapObject> {
        let mut objects = self.objects.borrow_mut();
        let index = objects.iter().position(|o| o.id == id)?;
        Some(objects.remove(index))
    }
}
