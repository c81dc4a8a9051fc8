//! # Error 模块
//!
//! 定义 round-player 中使用的错误类型。

use thiserror::Error;

/// 播放错误
///
/// 正常播放不会出错：缺失的节点、事件、图层都按空操作处理。
/// 唯一的错误是引擎关闭时正在等待的例程被取消。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    /// 等待的帧或定时器被 `stop_all` 取消
    #[error("动画已被取消")]
    Cancelled,
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
