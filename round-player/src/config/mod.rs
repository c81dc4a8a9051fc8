//! # Config 模块
//!
//! 播放配置，集中管理图层名称与各类法术的时长常量。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高，由宿主处理）
//! 2. 配置文件 (JSON)
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// 播放配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// token 所在的场景图层名称
    #[serde(default = "default_token_layer")]
    pub token_layer: String,

    /// 是否重新播放已执行的事件
    ///
    /// 默认关闭：重新订阅游标时不会把已经播放过的事件再播一遍。
    #[serde(default)]
    pub replay_executed_events: bool,

    /// 法术时长
    #[serde(default)]
    pub timing: SpellTimingConfig,
}

/// 法术时长配置（毫秒，未按播放速度换算）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellTimingConfig {
    /// 弹道：飞行时间之外的余量
    #[serde(default = "default_projectile_buffer")]
    pub projectile_buffer_ms: f64,

    /// 弹道爆发：飞行时间之外的余量，同时覆盖落点爆发
    #[serde(default = "default_projectile_burst_buffer")]
    pub projectile_burst_buffer_ms: f64,

    /// 原地爆发
    #[serde(default = "default_burst")]
    pub burst_ms: f64,

    /// 射线
    #[serde(default = "default_ray")]
    pub ray_ms: f64,

    /// 区域展开（行动未声明时长时）
    #[serde(default = "default_area")]
    pub area_default_ms: f64,

    /// 未知类别（行动未声明时长时）
    #[serde(default = "default_fallback")]
    pub fallback_ms: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            token_layer: default_token_layer(),
            replay_executed_events: false,
            timing: SpellTimingConfig::default(),
        }
    }
}

impl Default for SpellTimingConfig {
    fn default() -> Self {
        Self {
            projectile_buffer_ms: default_projectile_buffer(),
            projectile_burst_buffer_ms: default_projectile_burst_buffer(),
            burst_ms: default_burst(),
            ray_ms: default_ray(),
            area_default_ms: default_area(),
            fallback_ms: default_fallback(),
        }
    }
}

// 默认值函数
fn default_token_layer() -> String {
    "tokens".to_string()
}

fn default_projectile_buffer() -> f64 {
    200.0
}

fn default_projectile_burst_buffer() -> f64 {
    500.0
}

fn default_burst() -> f64 {
    600.0
}

fn default_ray() -> f64 {
    800.0
}

fn default_area() -> f64 {
    800.0
}

fn default_fallback() -> f64 {
    1000.0
}

impl PlaybackConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = ?path, "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = ?path, error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_layer.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "token_layer 不能为空".to_string(),
            ));
        }

        let timing = &self.timing;
        let fields = [
            ("projectile_buffer_ms", timing.projectile_buffer_ms),
            ("projectile_burst_buffer_ms", timing.projectile_burst_buffer_ms),
            ("burst_ms", timing.burst_ms),
            ("ray_ms", timing.ray_ms),
            ("area_default_ms", timing.area_default_ms),
            ("fallback_ms", timing.fallback_ms),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} 必须是非负有限值，实际为 {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
