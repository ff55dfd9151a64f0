//! # Manager 模块
//!
//! 动画管理器：持有全部句柄表，提供逐帧推进入口和脚本绑定调用的所有操作。
//!
//! ## 设计理念
//!
//! 管理器只负责：
//! 1. 管理对象生命周期：句柄表分配/销毁，创建时保持脚本值，销毁时释放
//! 2. 推进时间轴：`update(dt)` 先推进补间，再推进精灵帧动画
//! 3. 派发回调：回调拿到 `&mut AnimationManager`，可以任意重入
//!
//! ## 重入安全
//!
//! 每次推进先对句柄表做快照，逐个重新解析句柄；回调返回后重新读取表项，
//! 句柄失效视为正常情况直接跳过，从不在持有表项借用时调用回调。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let mut manager = AnimationManager::new();
//!
//! // 脚本: Tween.to(obj, :x, 100, duration: 1, ease: :out_back)
//! manager.tween_to(&mut host, obj, "x", 100.0,
//!     TweenOptions::new(1.0).with_easing(Easing::OutBack))?;
//!
//! // 游戏主循环
//! manager.update(&mut host, dt)?;
//! ```

mod animators;
mod sprites;
mod state_machines;
mod tweens;

use std::fmt;

use tracing::{trace, warn};

use crate::animator::AnimatorState;
use crate::config::AnimationConfig;
use crate::error::AnimResult;
use crate::handle::{AnimatorId, HandleTable, SpriteAnimationId, StateMachineId, TweenId};
use crate::host::{ScriptArg, ScriptHost};
use crate::sprite_animation::SpriteAnimationState;
use crate::state_machine::StateMachineState;
use crate::tween::TweenState;

/// 动画管理器
///
/// 宿主通常只持有一个实例，由游戏主循环每帧调用一次 [`AnimationManager::update`]。
pub struct AnimationManager<H: ScriptHost> {
    pub(crate) sprite_animations: HandleTable<SpriteAnimationId, SpriteAnimationState<H::Value>>,
    pub(crate) animators: HandleTable<AnimatorId, AnimatorState<H::Value>>,
    pub(crate) tweens: HandleTable<TweenId, TweenState<H::Value>>,
    pub(crate) state_machines: HandleTable<StateMachineId, StateMachineState<H::Value>>,
    config: AnimationConfig,
    /// 已推进的帧数
    frame: u64,
}

impl<H: ScriptHost> Default for AnimationManager<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ScriptHost> fmt::Debug for AnimationManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationManager")
            .field("sprite_animations", &self.sprite_animations.len())
            .field("animators", &self.animators.len())
            .field("tweens", &self.tweens.len())
            .field("state_machines", &self.state_machines.len())
            .field("frame", &self.frame)
            .finish()
    }
}

impl<H: ScriptHost> AnimationManager<H> {
    /// 使用默认配置创建管理器
    pub fn new() -> Self {
        Self::with_config(AnimationConfig::default())
    }

    /// 使用指定配置创建管理器
    pub fn with_config(config: AnimationConfig) -> Self {
        Self {
            sprite_animations: HandleTable::new(),
            animators: HandleTable::new(),
            tweens: HandleTable::new(),
            state_machines: HandleTable::new(),
            config,
            frame: 0,
        }
    }

    /// 当前配置
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// 替换配置
    pub fn set_config(&mut self, config: AnimationConfig) {
        self.config = config;
    }

    /// 已推进的帧数
    pub fn frame(&self) -> u64 {
        self.frame
    }

    // ========== 逐帧推进 ==========

    /// 推进所有补间与精灵帧动画
    ///
    /// 由宿主主循环每帧调用一次。回调抛出的错误会在当前表项处理完后
    /// 向上传播，本帧尚未处理的表项留到下一帧。
    pub fn update(&mut self, host: &mut H, dt: f32) -> AnimResult<()> {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt = dt, "收到无效的 dt，按 0 处理");
        }
        let dt = self.config.effective_delta(dt);
        self.frame += 1;

        self.update_tweens(host, dt)?;
        self.update_sprite_animations(host, dt)?;
        Ok(())
    }

    // ========== 全局 ==========

    /// 销毁全部对象，释放所有保持的脚本值
    pub fn clear(&mut self, host: &mut H) {
        for tween in self.tweens.drain() {
            release_tween(host, &tween);
        }
        for animation in self.sprite_animations.drain() {
            release_sprite_animation(host, &animation);
        }
        for animator in self.animators.drain() {
            release_animator(host, &animator);
        }
        for machine in self.state_machines.drain() {
            for value in machine.script_values() {
                host.release(value);
            }
        }
    }

    /// 调用脚本回调
    pub(crate) fn invoke(
        &mut self,
        host: &mut H,
        callback: &H::Value,
        args: &[ScriptArg],
    ) -> AnimResult<bool> {
        host.call(self, callback, args)
    }

    /// 记录失效句柄访问
    pub(crate) fn stale(&self, kind: &'static str, handle: impl fmt::Debug) {
        if self.config.log_stale_handles {
            trace!(kind = kind, handle = ?handle, "句柄已失效，忽略");
        }
    }
}

/// 替换可选回调：保持新值，释放旧值
pub(crate) fn replace_callback<H: ScriptHost>(
    host: &mut H,
    slot: &mut Option<H::Value>,
    callback: Option<H::Value>,
) {
    if let Some(new) = &callback {
        host.retain(new);
    }
    if let Some(old) = std::mem::replace(slot, callback) {
        host.release(&old);
    }
}

pub(crate) fn release_tween<H: ScriptHost>(host: &mut H, tween: &TweenState<H::Value>) {
    host.release(&tween.target);
    for callback in [&tween.on_update, &tween.on_complete].into_iter().flatten() {
        host.release(callback);
    }
}

pub(crate) fn release_sprite_animation<H: ScriptHost>(
    host: &mut H,
    animation: &SpriteAnimationState<H::Value>,
) {
    host.release(&animation.sprite);
    for callback in [&animation.on_complete, &animation.on_frame_change]
        .into_iter()
        .flatten()
    {
        host.release(callback);
    }
}

pub(crate) fn release_animator<H: ScriptHost>(host: &mut H, animator: &AnimatorState<H::Value>) {
    host.release(&animator.sprite);
    for callback in animator.on_complete_callbacks.values() {
        host.release(callback);
    }
}
