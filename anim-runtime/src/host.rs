//! # Host 模块
//!
//! 脚本宿主接口定义。动画核心不了解宿主的对象模型，只通过这里的
//! trait 与之交互。
//!
//! ## 核心概念
//!
//! - `PropertyAccessor`: 按名称读写目标对象的数值属性（补间动画使用）
//! - `ScriptHost`: 完整的宿主能力：值保持（防止 GC 回收）、回调调用、
//!   精灵源矩形写入
//! - `ScriptArg`: 传给脚本回调的位置参数
//!
//! ## 回调与重入
//!
//! `ScriptHost::call` 会拿到 `&mut AnimationManager`，回调可以在执行期间
//! 再次调用管理器的任何操作（创建、取消补间，切换动画等）。管理器在调用
//! 回调前不会持有任何表项的借用。

use std::fmt;

use crate::error::AnimResult;
use crate::handle::AnimatorId;
use crate::manager::AnimationManager;
use crate::sprite_animation::SourceRect;

/// 属性访问器接口
///
/// 提供对任意宿主对象数值属性的 getter/setter 访问，
/// 动画核心从不假设有哪些属性存在。
pub trait PropertyAccessor {
    /// 脚本值（对象或回调）
    ///
    /// `PartialEq` 必须按对象身份比较（引用/句柄相等），
    /// 补间去重依赖这一点。
    type Value: Clone + PartialEq + fmt::Debug;

    /// 读取属性的当前值
    ///
    /// 属性不存在或不是数值时返回 `AnimError::Property`。
    fn get_property(&mut self, target: &Self::Value, property: &str) -> AnimResult<f32>;

    /// 写入属性
    fn set_property(&mut self, target: &Self::Value, property: &str, value: f32)
    -> AnimResult<()>;
}

/// 脚本宿主接口
///
/// 由嵌入脚本解释器的绑定层实现。
pub trait ScriptHost: PropertyAccessor + Sized {
    /// 保持脚本值，阻止宿主回收
    ///
    /// 原生对象创建时调用，与 [`ScriptHost::release`] 一一对应。
    fn retain(&mut self, _value: &Self::Value) {}

    /// 释放之前保持的脚本值
    fn release(&mut self, _value: &Self::Value) {}

    /// 调用脚本回调
    ///
    /// # 返回
    /// - `Ok(true)` / `Ok(false)`: 回调返回值的真假性（守卫条件使用）
    /// - `Err(_)`: 回调抛出了错误
    fn call(
        &mut self,
        manager: &mut AnimationManager<Self>,
        callback: &Self::Value,
        args: &[ScriptArg],
    ) -> AnimResult<bool>;

    /// 写入精灵的源矩形（精灵表中的当前帧）
    fn set_source_rect(&mut self, sprite: &Self::Value, rect: SourceRect);

    /// 查找对象上挂载的动画控制器
    ///
    /// 状态机附加到对象时调用，用于自动绑定动画。默认不查找。
    fn animator_of(&mut self, _owner: &Self::Value) -> Option<AnimatorId> {
        None
    }
}

/// 脚本回调参数
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    /// 浮点数
    Float(f32),
    /// 整数
    Int(i64),
    /// 字符串（动画名、状态名等）
    Str(String),
}

impl ScriptArg {
    /// 按浮点数读取（整数会被转换）
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ScriptArg::Float(v) => Some(*v),
            ScriptArg::Int(v) => Some(*v as f32),
            ScriptArg::Str(_) => None,
        }
    }

    /// 按整数读取
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScriptArg::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// 按字符串读取
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptArg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f32> for ScriptArg {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ScriptArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ScriptArg {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for ScriptArg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ScriptArg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl fmt::Display for ScriptArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptArg::Float(v) => write!(f, "{v}"),
            ScriptArg::Int(v) => write!(f, "{v}"),
            ScriptArg::Str(s) => write!(f, "{s:?}"),
        }
    }
}
