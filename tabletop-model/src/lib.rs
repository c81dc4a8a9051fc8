//! # Tabletop Model
//!
//! 战斗地图回放的数据层。
//!
//! ## 架构概述
//!
//! `tabletop-model` 是纯数据核心，不依赖任何渲染或调度：
//!
//! ```text
//! Round ──► Event ──► Action (Move / Appear / Disappear / Spell)
//!
//! TimelineStore   : 时间线 + 当前游标 + 播放速度
//! MapObjectStore  : 地图对象（token、特效、持续区域）
//! ```
//!
//! 播放引擎（`round-player`）通过这两个 trait 读写数据，
//! 因此可以用内存实现（[`MemoryTimeline`]、[`MemoryMapStore`]）做测试。
//!
//! ## 模块结构
//!
//! - [`action`]：行动数据（带标签的联合类型）
//! - [`timeline`]：回合/事件/游标与时间线存储
//! - [`map_object`]：地图对象与对象存储
//! - [`cleanup`]：按回合清理过期对象
//! - [`scenario`]：完整场景的加载与检查
//! - [`geometry`]：坐标
//! - [`error`]：错误类型

pub mod action;
pub mod cleanup;
pub mod error;
pub mod geometry;
pub mod map_object;
pub mod scenario;
pub mod timeline;

// 重导出核心类型
pub use action::{
    Action, ActionData, AppearData, DisappearData, MoveData, MoveEasing, SpellCategory, SpellData,
};
pub use cleanup::{CleanupReport, sweep_expired};
pub use error::{ModelError, ModelResult};
pub use geometry::Point;
pub use map_object::{
    MapObject, MapObjectStore, MemoryMapStore, ObjectKind, ObjectStyle, PersistentAreaInfo,
    SpellEffectInfo,
};
pub use scenario::Scenario;
pub use timeline::{
    Cursor, CursorListener, Event, ListenerId, MemoryTimeline, Round, TimelineStore,
};
