//! # Resolve 模块
//!
//! 按 token ID 在场景中查找对应节点。
//!
//! 渲染层可能在存储更新后异步重建或移动节点，因此依次尝试：
//! 1. 在 token 图层中查找
//! 2. 从根节点查找
//! 3. 逐个比对 token 图层的直接子节点
//!
//! 命中的若是复合节点内部的图形，向上找到带同一 ID 的最近容器。

use tracing::trace;

use crate::scene::{NodeId, SceneGraph};

/// 查找 token 节点
pub fn resolve_token_node(
    scene: &dyn SceneGraph,
    container: NodeId,
    token_id: &str,
) -> Option<NodeId> {
    let found = scene
        .find_one(container, token_id)
        .or_else(|| {
            trace!(token = %token_id, "图层内未找到，改为从根节点查找");
            scene.find_one(scene.root(), token_id)
        })
        .or_else(|| {
            trace!(token = %token_id, "根节点查找失败，逐个比对子节点");
            scene
                .children(container)
                .into_iter()
                .find(|child| scene.node_id(*child).as_deref() == Some(token_id))
        })?;

    if scene.is_container(found) {
        return Some(found);
    }

    Some(token_ancestor(scene, found, token_id).unwrap_or(found))
}

fn token_ancestor(scene: &dyn SceneGraph, node: NodeId, token_id: &str) -> Option<NodeId> {
    let mut current = scene.parent(node);
    while let Some(candidate) = current {
        if scene.is_container(candidate) && scene.node_id(candidate).as_deref() == Some(token_id) {
            return Some(candidate);
        }
        current = scene.parent(candidate);
    }
    None
}
