//! # Scene 模块
//!
//! 场景图端口。
//!
//! 场景节点由渲染层根据对象存储派生，播放引擎只做查询与属性读写，
//! 从不创建或销毁节点。token 在场景中是复合节点：
//!
//! ```text
//! Stage
//! └── Layer "tokens"
//!     └── Group #goblin      ← token 节点（位置/透明度在这里）
//!         ├── Shape (body)
//!         └── Shape (label)
//! ```

mod tree;

pub use tree::{NodeKind, SceneTree};

use tabletop_model::Point;

/// 场景节点句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// 场景图接口
///
/// 查询可能因为渲染层异步重建而失败，调用方必须容忍 `None`。
pub trait SceneGraph {
    /// 根节点
    fn root(&self) -> NodeId;

    /// 按名称查找根节点下的图层
    fn find_layer(&self, name: &str) -> Option<NodeId>;

    /// 在 `scope` 的后代中按 ID 查找节点
    fn find_one(&self, scope: NodeId, id: &str) -> Option<NodeId>;

    /// 直接子节点
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// 父节点
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// 节点的 ID 属性
    fn node_id(&self, node: NodeId) -> Option<String>;

    /// 是否为容器节点（图层或组）
    fn is_container(&self, node: NodeId) -> bool;

    /// 节点位置
    fn position(&self, node: NodeId) -> Option<Point>;

    /// 设置节点位置
    fn set_position(&self, node: NodeId, position: Point);

    /// 节点透明度
    fn opacity(&self, node: NodeId) -> Option<f32>;

    /// 设置节点透明度
    fn set_opacity(&self, node: NodeId, opacity: f32);
}
