//! # Timeline 模块
//!
//! 回合 → 事件 → 行动 三级时间线，以及当前播放游标。
//!
//! ## 游标模型
//!
//! ```text
//! Cursor { round, event }
//!   │ set_cursor()
//!   ▼
//! 监听者收到新游标（仅当游标实际变化时）
//! ```
//!
//! 时间线本身对播放引擎只读，引擎只会改写 `executed` 标记。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::ModelError;

/// 回合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// 回合编号
    pub number: u32,
    /// 有序事件列表
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Round {
    /// 创建空回合
    pub fn new(number: u32) -> Self {
        Self {
            number,
            events: Vec::new(),
        }
    }

    /// 追加事件
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    /// 按编号查找事件
    pub fn event(&self, number: u32) -> Option<&Event> {
        self.events.iter().find(|e| e.number == number)
    }
}

/// 事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// 事件 ID
    pub id: String,
    /// 事件编号（回合内）
    pub number: u32,
    /// 有序行动列表
    #[serde(default)]
    pub actions: Vec<Action>,
    /// 是否已执行
    #[serde(default)]
    pub executed: bool,
}

impl Event {
    /// 创建空事件
    pub fn new(id: impl Into<String>, number: u32) -> Self {
        Self {
            id: id.into(),
            number,
            actions: Vec::new(),
            executed: false,
        }
    }

    /// 追加行动
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// 按 `order` 稳定排序后的行动列表
    pub fn ordered_actions(&self) -> Vec<Action> {
        let mut actions = self.actions.clone();
        // sort_by_key 是稳定排序，相同 order 保持原始顺序
        actions.sort_by_key(|a| a.order);
        actions
    }
}

/// 播放游标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// 当前回合
    pub round: u32,
    /// 当前事件
    pub event: u32,
}

impl Cursor {
    /// 创建游标
    pub const fn new(round: u32, event: u32) -> Self {
        Self { round, event }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}E{}", self.round, self.event)
    }
}

/// 监听者 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// 游标变化监听者
pub type CursorListener = Rc<dyn Fn(Cursor)>;

/// 时间线存储接口
///
/// 所有方法都使用 `&self`，实现方自行处理内部可变性。
/// 写入必须立即对后续读取可见。
pub trait TimelineStore {
    /// 当前游标
    fn cursor(&self) -> Cursor;

    /// 移动游标；游标变化时通知所有监听者
    fn set_cursor(&self, cursor: Cursor);

    /// 订阅游标变化
    fn subscribe(&self, listener: CursorListener) -> ListenerId;

    /// 取消订阅
    fn unsubscribe(&self, id: ListenerId);

    /// 按编号获取回合（克隆）
    fn round(&self, number: u32) -> Option<Round>;

    /// 按回合与事件编号获取事件（克隆）
    fn event(&self, round: u32, number: u32) -> Option<Event>;

    /// 设置事件的执行标记
    fn set_event_executed(&self, event_id: &str, executed: bool) -> Result<(), ModelError>;

    /// 设置行动的执行标记
    fn set_action_executed(&self, action_id: &str, executed: bool) -> Result<(), ModelError>;

    /// 全局播放速度倍率
    fn animation_speed(&self) -> f64;
}

/// 内存时间线
pub struct MemoryTimeline {
    rounds: RefCell<Vec<Round>>,
    cursor: Cell<Cursor>,
    speed: Cell<f64>,
    listeners: RefCell<Vec<(ListenerId, CursorListener)>>,
    next_listener_id: Cell<u64>,
}

impl std::fmt::Debug for MemoryTimeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTimeline")
            .field("rounds", &self.rounds.borrow().len())
            .field("cursor", &self.cursor.get())
            .field("speed", &self.speed.get())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl Default for MemoryTimeline {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemoryTimeline {
    /// 创建时间线，游标指向第一个回合的第一个事件
    pub fn new(rounds: Vec<Round>) -> Self {
        let cursor = rounds
            .first()
            .map(|r| Cursor::new(r.number, r.events.first().map_or(1, |e| e.number)))
            .unwrap_or_else(|| Cursor::new(1, 1));

        Self {
            rounds: RefCell::new(rounds),
            cursor: Cell::new(cursor),
            speed: Cell::new(1.0),
            listeners: RefCell::new(Vec::new()),
            next_listener_id: Cell::new(1),
        }
    }

    /// 设置播放速度倍率
    pub fn set_animation_speed(&self, speed: f64) {
        self.speed.set(speed);
    }

    /// 所有回合的快照
    pub fn rounds(&self) -> Vec<Round> {
        self.rounds.borrow().clone()
    }

    /// 追加回合
    pub fn push_round(&self, round: Round) {
        self.rounds.borrow_mut().push(round);
    }

    /// 当前监听者数量
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// 按时间线顺序列出所有游标位置
    pub fn cursors(&self) -> Vec<Cursor> {
        self.rounds
            .borrow()
            .iter()
            .flat_map(|r| r.events.iter().map(|e| Cursor::new(r.number, e.number)))
            .collect()
    }
}

impl TimelineStore for MemoryTimeline {
    fn cursor(&self) -> Cursor {
        self.cursor.get()
    }

    fn set_cursor(&self, cursor: Cursor) {
        if self.cursor.get() == cursor {
            return;
        }
        self.cursor.set(cursor);

        // 先复制监听者列表再回调，允许回调中订阅/取消订阅
        let listeners: Vec<CursorListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(cursor);
        }
    }

    fn subscribe(&self, listener: CursorListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.get());
        self.next_listener_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    fn round(&self, number: u32) -> Option<Round> {
        self.rounds
            .borrow()
            .iter()
            .find(|r| r.number == number)
            .cloned()
    }

    fn event(&self, round: u32, number: u32) -> Option<Event> {
        self.rounds
            .borrow()
            .iter()
            .find(|r| r.number == round)
            .and_then(|r| r.event(number))
            .cloned()
    }

    fn set_event_executed(&self, event_id: &str, executed: bool) -> Result<(), ModelError> {
        let mut rounds = self.rounds.borrow_mut();
        let event = rounds
            .iter_mut()
            .flat_map(|r| r.events.iter_mut())
            .find(|e| e.id == event_id)
            .ok_or_else(|| ModelError::EventNotFound {
                id: event_id.to_string(),
            })?;
        event.executed = executed;
        Ok(())
    }

    fn set_action_executed(&self, action_id: &str, executed: bool) -> Result<(), ModelError> {
        let mut rounds = self.rounds.borrow_mut();
        let action = rounds
            .iter_mut()
            .flat_map(|r| r.events.iter_mut())
            .flat_map(|e| e.actions.iter_mut())
            .find(|a| a.id == action_id)
            .ok_or_else(|| ModelError::ActionNotFound {
                id: action_id.to_string(),
            })?;
        action.executed = executed;
        Ok(())
    }

    fn animation_speed(&self) -> f64 {
        self.speed.get()
    }
}
