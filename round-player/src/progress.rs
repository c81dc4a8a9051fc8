//! # Progress 模块
//!
//! 记录每个 token 正在进行的移动动画（起点、终点、进度），
//! 供路径预览等界面读取。

use std::cell::RefCell;
use std::collections::HashMap;

use tabletop_model::Point;

/// 动画进度接口
pub trait ProgressTracker {
    /// 开始记录一段移动
    fn start_animation(&self, token_id: &str, from: Point, to: Point);

    /// 更新进度（0.0 - 1.0，未应用缓动）
    fn update_progress(&self, token_id: &str, progress: f32);

    /// 结束记录
    fn end_animation(&self, token_id: &str);
}

/// 单个 token 的移动进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenProgress {
    /// 起点
    pub from: Point,
    /// 终点
    pub to: Point,
    /// 进度
    pub progress: f32,
}

impl TokenProgress {
    /// 按线性进度估算的位置（路径预览用）
    pub fn estimated_position(&self) -> Point {
        self.from.lerp(self.to, self.progress)
    }
}

/// 内存进度表
#[derive(Debug, Default)]
pub struct ProgressBoard {
    entries: RefCell<HashMap<String, TokenProgress>>,
}

impl ProgressBoard {
    /// 创建空进度表
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取 token 的进度
    pub fn get(&self, token_id: &str) -> Option<TokenProgress> {
        self.entries.borrow().get(token_id).copied()
    }

    /// token 是否在移动中
    pub fn is_animating(&self, token_id: &str) -> bool {
        self.entries.borrow().contains_key(token_id)
    }

    /// 正在移动的 token 数量
    pub fn active_count(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl ProgressTracker for ProgressBoard {
    fn start_animation(&self, token_id: &str, from: Point, to: Point) {
        self.entries.borrow_mut().insert(
            token_id.to_string(),
            TokenProgress {
                from,
                to,
                progress: 0.0,
            },
        );
    }

    fn update_progress(&self, token_id: &str, progress: f32) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(token_id) {
            entry.progress = progress.clamp(0.0, 1.0);
        }
    }

    fn end_animation(&self, token_id: &str) {
        self.entries.borrow_mut().remove(token_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lifecycle() {
        let board = ProgressBoard::new();
        board.start_animation("t1", Point::zero(), Point::new(100.0, 0.0));
        assert!(board.is_animating("t1"));

        board.update_progress("t1", 0.25);
        let entry = board.get("t1").unwrap();
        assert_eq!(entry.progress, 0.25);
        assert_eq!(entry.estimated_position(), Point::new(25.0, 0.0));

        board.update_progress("t1", 3.0);
        assert_eq!(board.get("t1").unwrap().progress, 1.0);

        board.end_animation("t1");
        assert!(!board.is_animating("t1"));
        assert_eq!(board.active_count(), 0);
    }

    #[test]
    fn test_update_without_start_is_ignored() {
        let board = ProgressBoard::new();
        board.update_progress("ghost", 0.5);
        assert!(board.get("ghost").is_none());
    }
}
