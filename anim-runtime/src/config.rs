//! # Config 模块
//!
//! 动画管理器配置。
//!
//! 所有字段都有默认值，配置文件（JSON）只需写出需要覆盖的项：
//!
//! ```json
//! { "time_scale": 0.5, "max_delta": 0.1 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::easing::Easing;
use crate::error::ConfigError;

/// 动画管理器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// 全局时间缩放（`update` 的 dt 会先乘以它）
    ///
    /// `0.0` 相当于冻结所有动画。
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,

    /// 单帧 dt 上限（秒）
    ///
    /// 用于防止卡顿后一帧跳过大量动画进度。`None` 表示不限制。
    #[serde(default)]
    pub max_delta: Option<f32>,

    /// 未指定缓动函数时使用的默认值
    #[serde(default)]
    pub default_easing: Easing,

    /// 是否记录失效句柄的访问（trace 级别）
    #[serde(default)]
    pub log_stale_handles: bool,
}

fn default_time_scale() -> f32 {
    1.0
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
            max_delta: None,
            default_easing: Easing::default(),
            log_stale_handles: false,
        }
    }
}

impl AnimationConfig {
    /// 从 JSON 字符串解析并校验
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        debug!(path = ?path, "动画配置加载成功");
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "time_scale 必须是不小于 0 的有限数，实际为 {}",
                self.time_scale
            )));
        }

        if let Some(max_delta) = self.max_delta {
            if !max_delta.is_finite() || max_delta <= 0.0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "max_delta 必须是大于 0 的有限数，实际为 {}",
                    max_delta
                )));
            }
        }

        Ok(())
    }

    /// 把宿主传入的原始 dt 转换为本帧实际推进的时间
    ///
    /// 负数或非有限值按 0 处理。
    pub fn effective_delta(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }

        let scaled = dt * self.time_scale;
        match self.max_delta {
            Some(max_delta) => scaled.min(max_delta),
            None => scaled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnimationConfig::default();
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.max_delta, None);
        assert_eq!(config.default_easing, Easing::Linear);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnimationConfig::from_json_str(r#"{ "max_delta": 0.1 }"#).unwrap();
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.max_delta, Some(0.1));
    }

    #[test]
    fn test_easing_by_name() {
        let config =
            AnimationConfig::from_json_str(r#"{ "default_easing": "out_back" }"#).unwrap();
        assert_eq!(config.default_easing, Easing::OutBack);
    }

    #[test]
    fn test_validation_rejects_negative_time_scale() {
        let result = AnimationConfig::from_json_str(r#"{ "time_scale": -1.0 }"#);
        assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_validation_rejects_zero_max_delta() {
        let result = AnimationConfig::from_json_str(r#"{ "max_delta": 0.0 }"#);
        assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_invalid_json() {
        let result = AnimationConfig::from_json_str("{ time_scale: }");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_effective_delta() {
        let config = AnimationConfig {
            time_scale: 2.0,
            max_delta: Some(0.1),
            ..Default::default()
        };
        assert_eq!(config.effective_delta(0.02), 0.04);
        assert_eq!(config.effective_delta(0.5), 0.1);
        assert_eq!(config.effective_delta(-1.0), 0.0);
        assert_eq!(config.effective_delta(f32::NAN), 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.json");

        let config = AnimationConfig {
            time_scale: 0.5,
            default_easing: Easing::InOutSine,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = AnimationConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = AnimationConfig::load("definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
