//! # Error 模块
//!
//! 定义 tabletop-model 中使用的错误类型。

use thiserror::Error;

/// 数据层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// 对象 ID 重复
    #[error("对象 '{id}' 已存在")]
    DuplicateObject { id: String },

    /// 事件未找到
    #[error("事件 '{id}' 未找到")]
    EventNotFound { id: String },

    /// 行动未找到
    #[error("行动 '{id}' 未找到")]
    ActionNotFound { id: String },

    /// 场景文件解析失败
    #[error("场景解析失败: {message}")]
    ScenarioParse { message: String },
}

/// Result 类型别名
pub type ModelResult<T> = Result<T, ModelError>;
