//! # Anim Runtime
//!
//! 2D 脚本游戏引擎的动画调度核心。
//!
//! ## 架构概述
//!
//! `anim-runtime` 不依赖任何渲染后端或脚本解释器。它通过 [`ScriptHost`]
//! 与嵌入脚本的宿主层通信：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── create / play / trigger ────►│  （脚本绑定调用）
//!   │──── update(dt) ─────────────────►│  （每帧一次）
//!   │◄─── set_property / set_source_rect│
//!   │◄─── call(callback, args) ────────│  （回调可重入管理器）
//!   │                                   │
//! ```
//!
//! ## 核心类型
//!
//! - [`AnimationManager`]：持有全部对象的句柄表，逐帧推进
//! - [`SpriteAnimationState`]：精灵表帧动画
//! - [`TweenState`]：单个数值属性的补间
//! - [`AnimatorState`]：带切换规则的命名动画集合
//! - [`StateMachineState`]：事件驱动的有限状态机
//!
//! ## 使用示例
//!
//! ```ignore
//! use anim_runtime::{AnimationManager, Easing, SpriteSheet, TransitionMode, TweenOptions};
//!
//! let mut manager = AnimationManager::new();
//!
//! let animator = manager.create_animator(&mut host, sprite, SpriteSheet::new(32, 32, 8)?)?;
//! manager.add_animation(&mut host, animator, "idle", vec![0, 1, 2, 3], 8.0, true)?;
//! manager.add_animation(&mut host, animator, "attack", vec![8, 9, 10], 12.0, false)?;
//! manager.play(&mut host, animator, "idle", TransitionMode::Immediate)?;
//!
//! manager.tween_to(&mut host, panel, "alpha", 1.0,
//!     TweenOptions::new(0.3).with_easing(Easing::OutQuad))?;
//!
//! // 主循环
//! loop {
//!     manager.update(&mut host, dt)?;
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`handle`]：句柄表与原始句柄转换
//! - [`easing`]：缓动函数
//! - [`sprite_animation`]：帧动画状态与推进
//! - [`tween`]：补间状态与推进
//! - [`animator`]：动画控制器与切换规则
//! - [`state_machine`]：状态机定义与构建器
//! - [`manager`]：管理器与全部绑定操作
//! - [`host`]：宿主接口
//! - [`config`]：配置
//! - [`error`]：错误类型定义

pub mod animator;
pub mod config;
pub mod easing;
pub mod error;
pub mod handle;
pub mod host;
pub mod manager;
pub mod sprite_animation;
pub mod state_machine;
pub mod tween;

// 重导出核心类型
pub use animator::{AnimatorState, TransitionMode};
pub use config::AnimationConfig;
pub use easing::Easing;
pub use error::{AnimError, AnimResult, ConfigError};
pub use handle::{
    AnimatorId, HandleExt, HandleTable, INVALID_HANDLE, RawHandle, SpriteAnimationId,
    StateMachineId, TweenId,
};
pub use host::{PropertyAccessor, ScriptArg, ScriptHost};
pub use manager::AnimationManager;
pub use sprite_animation::{FrameAdvance, SourceRect, SpriteAnimationState, SpriteSheet};
pub use state_machine::{StateBuilder, StateMachineBuilder, StateMachineState};
pub use tween::{TweenFrame, TweenOptions, TweenState};
