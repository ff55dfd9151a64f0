//! # Error 模块
//!
//! 定义 anim-runtime 中使用的错误类型。
//!
//! 只有脚本调用方违反契约时才会返回错误；句柄失效、策略性拒绝
//! （例如不允许的动画切换）都不是错误，调用方通过返回值感知。

use thiserror::Error;

/// 动画核心错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimError {
    /// 动画名不存在
    #[error("动画 '{name}' 不存在，可用动画: [{}]", .available.join(", "))]
    UnknownAnimation { name: String, available: Vec<String> },

    /// 状态名不存在
    #[error("状态 '{name}' 不存在，可用状态: [{}]", .available.join(", "))]
    UnknownState { name: String, available: Vec<String> },

    /// 缓动函数名不存在
    #[error("未知的缓动函数 '{name}'，可用值: [{}]", crate::easing::Easing::names().join(", "))]
    UnknownEasing { name: String },

    /// 帧率无效
    #[error("帧率必须是大于 0 的有限数，实际为 {fps}")]
    InvalidFps { fps: f32 },

    /// 时长无效
    #[error("时长必须是不小于 0 的有限数，实际为 {duration}")]
    InvalidDuration { duration: f32 },

    /// 延迟无效
    #[error("延迟必须是不小于 0 的有限数，实际为 {delay}")]
    InvalidDelay { delay: f32 },

    /// 精灵表几何参数无效
    #[error("无效的精灵表参数: {message}")]
    InvalidSheet { message: String },

    /// 帧编号超出精灵表坐标范围
    #[error("帧 {frame} 超出精灵表坐标范围（{frame_width}x{frame_height}，每行 {columns} 帧）")]
    InvalidFrame {
        frame: u32,
        frame_width: u32,
        frame_height: u32,
        columns: u32,
    },

    /// 状态重复定义
    #[error("状态 '{name}' 重复定义")]
    DuplicateState { name: String },

    /// 状态机没有任何状态
    #[error("状态机至少需要定义一个状态")]
    EmptyStateMachine,

    /// 属性读写失败
    #[error("属性 '{property}' 访问失败: {message}")]
    Property { property: String, message: String },

    /// 脚本回调抛出错误
    #[error("脚本回调执行失败: {message}")]
    Callback { message: String },
}

impl AnimError {
    /// 创建属性访问错误
    pub fn property(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Property {
            property: property.into(),
            message: message.into(),
        }
    }

    /// 创建回调错误
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写配置文件失败
    #[error("配置文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析或序列化失败
    #[error("配置文件格式错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置项取值无效
    #[error("配置校验失败: {0}")]
    ValidationFailed(String),
}

/// Result 类型别名
pub type AnimResult<T> = Result<T, AnimError>;
