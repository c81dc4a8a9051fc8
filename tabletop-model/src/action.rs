//! # Action 模块
//!
//! 定义时间线中单个行动（Action）的数据。
//!
//! ## 设计原则
//!
//! - **声明式**：Action 只描述"发生了什么"，不描述"怎么播放"
//! - **封闭变体**：`ActionData` 是带标签的联合类型，播放端必须穷尽匹配
//! - Action 由编辑器创建，播放引擎只会改写 `executed` 标记

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// 单个行动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// 行动 ID
    pub id: String,
    /// 执行者 token 的 ID
    pub token_id: String,
    /// 行动负载
    pub data: ActionData,
    /// 同一事件内的排序键（相同时保持原始顺序）
    #[serde(default)]
    pub order: i32,
    /// 是否已执行
    #[serde(default)]
    pub executed: bool,
}

impl Action {
    /// 创建新的行动
    pub fn new(id: impl Into<String>, token_id: impl Into<String>, data: ActionData) -> Self {
        Self {
            id: id.into(),
            token_id: token_id.into(),
            data,
            order: 0,
            executed: false,
        }
    }

    /// 设置排序键
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 是否为法术行动（法术不需要场景节点）
    pub fn is_spell(&self) -> bool {
        matches!(self.data, ActionData::Spell(_))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.data {
            ActionData::Move(m) => write!(
                f,
                "[{}] {} move -> {} in {}ms",
                self.order, self.token_id, m.to_position, m.duration
            ),
            ActionData::Appear(a) => write!(
                f,
                "[{}] {} appear at {}{}",
                self.order,
                self.token_id,
                a.position,
                if a.fade_in { " (fade)" } else { "" }
            ),
            ActionData::Disappear(d) => write!(
                f,
                "[{}] {} disappear{}",
                self.order,
                self.token_id,
                if d.fade_out { " (fade)" } else { "" }
            ),
            ActionData::Spell(s) => write!(
                f,
                "[{}] {} casts {} ({}) {} -> {}",
                self.order,
                self.token_id,
                s.spell_name,
                s.category,
                s.from_position,
                s.to_position
            ),
        }
    }
}

/// 行动负载
///
/// 线上格式使用 `type` 字段区分：`move` / `appear` / `disappear` / `spell`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionData {
    /// 移动
    Move(MoveData),
    /// 出现
    Appear(AppearData),
    /// 消失
    Disappear(DisappearData),
    /// 施法
    Spell(SpellData),
}

/// 移动数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveData {
    /// 目标位置
    pub to_position: Point,
    /// 编辑时记录的起点（播放时不使用，起点总是节点的实时位置）
    #[serde(default)]
    pub from_position: Option<Point>,
    /// 时长（毫秒）
    #[serde(default = "default_move_duration")]
    pub duration: f64,
    /// 缓动
    #[serde(default)]
    pub easing: MoveEasing,
}

impl MoveData {
    /// 创建移动数据
    pub fn new(to_position: Point, duration: f64) -> Self {
        Self {
            to_position,
            from_position: None,
            duration,
            easing: MoveEasing::default(),
        }
    }

    /// 设置缓动
    pub fn with_easing(mut self, easing: MoveEasing) -> Self {
        self.easing = easing;
        self
    }

    /// 设置编辑时记录的起点
    pub fn with_from(mut self, from: Point) -> Self {
        self.from_position = Some(from);
        self
    }
}

/// 移动缓动
///
/// 编辑器只区分 `linear` 和其他值，未知字符串一律视为平滑缓动。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MoveEasing {
    /// 匀速
    Linear,
    /// 平滑（两头慢中间快）
    #[default]
    Smooth,
}

impl From<String> for MoveEasing {
    fn from(value: String) -> Self {
        if value == "linear" {
            Self::Linear
        } else {
            Self::Smooth
        }
    }
}

impl From<MoveEasing> for String {
    fn from(value: MoveEasing) -> Self {
        match value {
            MoveEasing::Linear => "linear".to_string(),
            MoveEasing::Smooth => "easeInOut".to_string(),
        }
    }
}

/// 出现数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearData {
    /// 出现位置
    pub position: Point,
    /// 是否淡入
    #[serde(default)]
    pub fade_in: bool,
    /// 时长（毫秒）
    #[serde(default = "default_fade_duration")]
    pub duration: f64,
}

/// 消失数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisappearData {
    /// 消失位置（仅供编辑器展示）
    #[serde(default)]
    pub position: Option<Point>,
    /// 是否淡出
    #[serde(default)]
    pub fade_out: bool,
    /// 时长（毫秒）
    #[serde(default = "default_fade_duration")]
    pub duration: f64,
}

/// 法术类别
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpellCategory {
    /// 弹道：从施法者飞向目标
    Projectile,
    /// 弹道 + 落点爆发
    ProjectileBurst,
    /// 原地爆发
    Burst,
    /// 射线
    Ray,
    /// 区域：在目标点展开，可留下持续区域
    Area,
    /// 未识别的类别（保留原始字符串）
    Other(String),
}

impl SpellCategory {
    /// 是否为飞行类（特效从施法者出发）
    pub fn is_travelling(&self) -> bool {
        matches!(self, Self::Projectile | Self::ProjectileBurst | Self::Ray)
    }

    /// 是否可以留下持续区域
    pub fn can_persist(&self) -> bool {
        matches!(self, Self::Area | Self::ProjectileBurst)
    }

    /// 线上格式名称
    pub fn as_str(&self) -> &str {
        match self {
            Self::Projectile => "projectile",
            Self::ProjectileBurst => "projectile-burst",
            Self::Burst => "burst",
            Self::Ray => "ray",
            Self::Area => "area",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for SpellCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "projectile" => Self::Projectile,
            "projectile-burst" => Self::ProjectileBurst,
            "burst" => Self::Burst,
            "ray" => Self::Ray,
            "area" => Self::Area,
            _ => Self::Other(value),
        }
    }
}

impl From<SpellCategory> for String {
    fn from(value: SpellCategory) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for SpellCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 施法数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellData {
    /// 类别
    pub category: SpellCategory,
    /// 编辑时记录的施法者位置
    pub from_position: Point,
    /// 目标位置
    pub to_position: Point,
    /// 特效颜色
    #[serde(default = "default_spell_color")]
    pub color: String,
    /// 特效尺寸
    #[serde(default = "default_spell_size")]
    pub size: f32,
    /// 爆发半径（缺省时使用 `size`）
    #[serde(default)]
    pub burst_radius: Option<f32>,
    /// 弹道速度（像素/秒）
    #[serde(default = "default_projectile_speed")]
    pub projectile_speed: f32,
    /// 声明的时长（毫秒），仅 area 与未知类别使用
    #[serde(default)]
    pub duration: Option<f64>,
    /// 持续区域的存在时长（回合）
    #[serde(default)]
    pub persist_duration: u32,
    /// 持续区域颜色（缺省时使用 `color`）
    #[serde(default)]
    pub persist_color: Option<String>,
    /// 持续区域透明度
    #[serde(default)]
    pub persist_opacity: Option<f32>,
    /// 持续区域是否跟随目标 token
    #[serde(default)]
    pub track_target: bool,
    /// 跟随的目标 token
    #[serde(default)]
    pub target_token_id: Option<String>,
    /// 法术名称
    #[serde(default)]
    pub spell_name: String,
}

impl SpellData {
    /// 创建施法数据（其余字段取默认值）
    pub fn new(category: SpellCategory, from_position: Point, to_position: Point) -> Self {
        Self {
            category,
            from_position,
            to_position,
            color: default_spell_color(),
            size: default_spell_size(),
            burst_radius: None,
            projectile_speed: default_projectile_speed(),
            duration: None,
            persist_duration: 0,
            persist_color: None,
            persist_opacity: None,
            track_target: false,
            target_token_id: None,
            spell_name: String::new(),
        }
    }

    /// 持续区域半径
    pub fn area_radius(&self) -> f32 {
        self.burst_radius.unwrap_or(self.size)
    }

    /// 是否会留下持续区域
    pub fn persists(&self) -> bool {
        self.persist_duration > 0 && self.category.can_persist()
    }
}

fn default_move_duration() -> f64 {
    500.0
}

fn default_fade_duration() -> f64 {
    300.0
}

fn default_spell_color() -> String {
    "#ff4500".to_string()
}

fn default_spell_size() -> f32 {
    20.0
}

fn default_projectile_speed() -> f32 {
    500.0
}
