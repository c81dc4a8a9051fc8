//! # Tree 模块
//!
//! 内存场景树，实现 [`SceneGraph`]。
//!
//! 用于无头回放和测试；真实宿主用自己的渲染层实现 `SceneGraph`。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tabletop_model::{MapObject, Point};

use super::{NodeId, SceneGraph};

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// 舞台（根节点）
    Stage,
    /// 图层
    Layer,
    /// 组（复合节点）
    Group,
    /// 图形（叶子）
    Shape,
}

impl NodeKind {
    fn is_container(self) -> bool {
        !matches!(self, Self::Shape)
    }
}

#[derive(Debug, Clone)]
struct SceneNode {
    kind: NodeKind,
    id: Option<String>,
    name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Point,
    opacity: f32,
}

/// 内存场景树
#[derive(Debug)]
pub struct SceneTree {
    nodes: RefCell<HashMap<NodeId, SceneNode>>,
    next_id: Cell<u64>,
    root: NodeId,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// 创建只有舞台的场景树
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            SceneNode {
                kind: NodeKind::Stage,
                id: None,
                name: None,
                parent: None,
                children: Vec::new(),
                position: Point::zero(),
                opacity: 1.0,
            },
        );

        Self {
            nodes: RefCell::new(nodes),
            next_id: Cell::new(1),
            root,
        }
    }

    /// 根据地图对象派生场景：一个 token 图层，每个 token 一个组
    pub fn from_objects(objects: &[MapObject], token_layer: &str) -> Self {
        let tree = Self::new();
        let layer = tree.add_layer(token_layer);
        for object in objects.iter().filter(|o| o.is_token()) {
            let group = tree.add_group(layer, Some(&object.id), object.position);
            tree.set_opacity(group, object.opacity);
            tree.add_shape(group, None, Point::zero());
        }
        tree
    }

    fn insert(
        &self,
        parent: NodeId,
        kind: NodeKind,
        id: Option<&str>,
        name: Option<&str>,
        position: Point,
    ) -> NodeId {
        let node = NodeId(self.next_id.get());
        self.next_id.set(node.0 + 1);

        let mut nodes = self.nodes.borrow_mut();
        nodes.insert(
            node,
            SceneNode {
                kind,
                id: id.map(str::to_string),
                name: name.map(str::to_string),
                parent: Some(parent),
                children: Vec::new(),
                position,
                opacity: 1.0,
            },
        );
        if let Some(p) = nodes.get_mut(&parent) {
            p.children.push(node);
        }
        node
    }

    /// 添加图层
    pub fn add_layer(&self, name: &str) -> NodeId {
        self.insert(self.root, NodeKind::Layer, None, Some(name), Point::zero())
    }

    /// 添加组
    pub fn add_group(&self, parent: NodeId, id: Option<&str>, position: Point) -> NodeId {
        self.insert(parent, NodeKind::Group, id, None, position)
    }

    /// 添加图形
    pub fn add_shape(&self, parent: NodeId, id: Option<&str>, position: Point) -> NodeId {
        self.insert(parent, NodeKind::Shape, id, None, position)
    }

    /// 节点类型
    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.borrow().get(&node).map(|n| n.kind)
    }

    /// 移除节点及其子树
    pub fn remove(&self, node: NodeId) {
        if node == self.root {
            return;
        }
        let mut nodes = self.nodes.borrow_mut();
        let parent = nodes.get(&node).and_then(|n| n.parent);
        if let Some(p) = parent.and_then(|p| nodes.get_mut(&p)) {
            p.children.retain(|c| *c != node);
        }

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(removed) = nodes.remove(&current) {
                stack.extend(removed.children);
            }
        }
    }

    /// 把节点移到新的父节点下（模拟渲染层重建）
    pub fn reparent(&self, node: NodeId, new_parent: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if node == self.root || !nodes.contains_key(&node) || !nodes.contains_key(&new_parent) {
            return;
        }

        let old_parent = nodes.get(&node).and_then(|n| n.parent);
        if let Some(p) = old_parent.and_then(|p| nodes.get_mut(&p)) {
            p.children.retain(|c| *c != node);
        }
        if let Some(n) = nodes.get_mut(&node) {
            n.parent = Some(new_parent);
        }
        if let Some(p) = nodes.get_mut(&new_parent) {
            p.children.push(node);
        }
    }

    /// 节点数量（含根节点）
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// 是否只有根节点
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl SceneGraph for SceneTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn find_layer(&self, name: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        nodes.get(&self.root)?.children.iter().copied().find(|c| {
            nodes
                .get(c)
                .is_some_and(|n| n.kind == NodeKind::Layer && n.name.as_deref() == Some(name))
        })
    }

    fn find_one(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        // 先序深度优先，与渲染库的选择器查找顺序一致
        let mut stack: Vec<NodeId> = nodes.get(&scope)?.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let Some(node) = nodes.get(&current) else {
                continue;
            };
            if node.id.as_deref() == Some(id) {
                return Some(current);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(&node).and_then(|n| n.parent)
    }

    fn node_id(&self, node: NodeId) -> Option<String> {
        self.nodes.borrow().get(&node).and_then(|n| n.id.clone())
    }

    fn is_container(&self, node: NodeId) -> bool {
        self.nodes
            .borrow()
            .get(&node)
            .is_some_and(|n| n.kind.is_container())
    }

    fn position(&self, node: NodeId) -> Option<Point> {
        self.nodes.borrow().get(&node).map(|n| n.position)
    }

    fn set_position(&self, node: NodeId, position: Point) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            n.position = position;
        }
    }

    fn opacity(&self, node: NodeId) -> Option<f32> {
        self.nodes.borrow().get(&node).map(|n| n.opacity)
    }

    fn set_opacity(&self, node: NodeId, opacity: f32) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            n.opacity = opacity;
        }
    }
}
