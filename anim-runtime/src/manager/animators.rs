//! 动画控制器：命名动画的增删、切换规则与播放。

use tracing::{debug, trace};

use super::{AnimationManager, release_animator, release_sprite_animation};
use crate::animator::{AnimatorState, TransitionMode};
use crate::error::AnimResult;
use crate::handle::{AnimatorId, SpriteAnimationId};
use crate::host::ScriptHost;
use crate::sprite_animation::{SpriteAnimationState, SpriteSheet};

impl<H: ScriptHost> AnimationManager<H> {
    // ========== 创建与销毁 ==========

    /// `Animator.new`：为精灵创建动画控制器
    pub fn create_animator(
        &mut self,
        host: &mut H,
        sprite: H::Value,
        sheet: SpriteSheet,
    ) -> AnimResult<AnimatorId> {
        let animator = AnimatorState::new(sprite, sheet)?;
        host.retain(&animator.sprite);
        debug!(
            frame_width = sheet.frame_width,
            frame_height = sheet.frame_height,
            columns = sheet.columns,
            "创建动画控制器"
        );
        Ok(self.animators.insert(animator))
    }

    /// 销毁动画控制器及其拥有的全部帧动画
    pub fn destroy_animator(&mut self, host: &mut H, id: AnimatorId) -> bool {
        let Some(animator) = self.animators.remove(id) else {
            self.stale("animator", id);
            return false;
        };

        for &animation_id in animator.animations.values() {
            if let Some(animation) = self.sprite_animations.remove(animation_id) {
                release_sprite_animation(host, &animation);
            }
        }
        release_animator(host, &animator);
        debug!(animations = animator.animations.len(), "销毁动画控制器");
        true
    }

    /// `Animator#add`：添加命名动画
    ///
    /// 同名动画会被替换，旧动画随之销毁。句柄已失效时返回 `Ok(None)`。
    pub fn add_animation(
        &mut self,
        host: &mut H,
        id: AnimatorId,
        name: &str,
        frames: Vec<u32>,
        fps: f32,
        looping: bool,
    ) -> AnimResult<Option<SpriteAnimationId>> {
        let Some(animator) = self.animators.get(id) else {
            self.stale("animator", id);
            return Ok(None);
        };

        let mut animation = SpriteAnimationState::new(
            animator.sprite.clone(),
            animator.sheet,
            frames,
            fps,
            looping,
        )?;
        animation.owner = Some((id, name.to_string()));
        host.retain(&animation.sprite);
        let animation_id = self.sprite_animations.insert(animation);

        let mut is_current = false;
        let replaced = self.animators.get_mut(id).and_then(|animator| {
            is_current = animator.current() == Some(name);
            animator.animations.insert(name.to_string(), animation_id)
        });

        if let Some(old) = replaced {
            debug!(name = %name, "替换同名动画");
            if let Some(animation) = self.sprite_animations.remove(old) {
                release_sprite_animation(host, &animation);
            }
        }

        // 替换了正在显示的动画：新动画接着显示
        if is_current {
            if let Some(animation) = self.sprite_animations.get_mut(animation_id) {
                animation.restart();
            }
            self.write_source_rect(host, animation_id);
        }

        debug!(name = %name, fps = fps, looping = looping, "添加动画");
        Ok(Some(animation_id))
    }

    /// 移除命名动画
    pub fn remove_animation(&mut self, host: &mut H, id: AnimatorId, name: &str) -> bool {
        let Some(animator) = self.animators.get_mut(id) else {
            self.stale("animator", id);
            return false;
        };
        let Some(animation_id) = animator.animations.remove(name) else {
            return false;
        };
        if animator.current() == Some(name) {
            animator.current = None;
        }
        if animator.queued() == Some(name) {
            animator.queued = None;
        }
        let callback = animator.on_complete_callbacks.remove(name);

        if let Some(callback) = callback {
            host.release(&callback);
        }
        if let Some(animation) = self.sprite_animations.remove(animation_id) {
            release_sprite_animation(host, &animation);
        }
        true
    }

    // ========== 切换规则 ==========

    /// 登记允许的切换 `from -> targets`
    pub fn allow_transition<I, S>(&mut self, id: AnimatorId, from: &str, targets: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.animators.get_mut(id) {
            Some(animator) => {
                animator.allow_transition(from, targets);
                true
            }
            None => false,
        }
    }

    /// 登记可从任意状态进入的动画
    pub fn allow_from_any(&mut self, id: AnimatorId, name: &str) -> bool {
        match self.animators.get_mut(id) {
            Some(animator) => {
                animator.allow_from_any(name);
                true
            }
            None => false,
        }
    }

    /// `can_play?`：动画存在且切换规则允许
    pub fn can_play(&self, id: AnimatorId, name: &str) -> bool {
        self.animators
            .get(id)
            .is_some_and(|animator| animator.can_play(name))
    }

    // ========== 播放 ==========

    /// `Animator#play`
    ///
    /// # 返回
    /// - `Ok(true)`: 已切换，或已排队等待当前动画结束
    /// - `Ok(false)`: 已是当前动画、切换规则不允许，或句柄已失效
    /// - `Err(UnknownAnimation)`: 没有这个名称的动画
    pub fn play(
        &mut self,
        host: &mut H,
        id: AnimatorId,
        name: &str,
        mode: TransitionMode,
    ) -> AnimResult<bool> {
        let Some(animator) = self.animators.get(id) else {
            self.stale("animator", id);
            return Ok(false);
        };
        animator.require(name)?;

        if animator.current() == Some(name) {
            return Ok(false);
        }
        if !animator.can_transition(name) {
            trace!(from = ?animator.current(), to = %name, "切换规则不允许，忽略");
            return Ok(false);
        }

        if mode == TransitionMode::FinishCurrent {
            let busy = animator
                .current_animation()
                .and_then(|current| self.sprite_animations.get(current))
                .is_some_and(|animation| animation.is_playing() && !animation.is_complete());
            if busy {
                if let Some(animator) = self.animators.get_mut(id) {
                    debug!(
                        current = ?animator.current(),
                        queued = %name,
                        "等待当前动画结束"
                    );
                    animator.queued = Some(name.to_string());
                }
                return Ok(true);
            }
        }

        self.switch_animation(host, id, name);
        Ok(true)
    }

    /// 立即切换：停止当前动画，从头播放目标动画
    fn switch_animation(&mut self, host: &mut H, id: AnimatorId, name: &str) {
        let Some(animator) = self.animators.get_mut(id) else {
            return;
        };
        let Some(next) = animator.animation(name) else {
            return;
        };
        let previous = animator.current_animation();
        debug!(from = ?animator.current(), to = %name, "切换动画");
        animator.current = Some(name.to_string());
        animator.queued = None;

        if let Some(previous) = previous.filter(|&previous| previous != next) {
            if let Some(animation) = self.sprite_animations.get_mut(previous) {
                animation.stop();
            }
        }
        if let Some(animation) = self.sprite_animations.get_mut(next) {
            animation.restart();
        }
        self.write_source_rect(host, next);
    }

    /// 停止当前动画（停在当前帧），清除排队的切换
    pub fn stop_animator(&mut self, id: AnimatorId) -> bool {
        let Some(animator) = self.animators.get_mut(id) else {
            self.stale("animator", id);
            return false;
        };
        animator.queued = None;
        if let Some(current) = animator.current_animation() {
            if let Some(animation) = self.sprite_animations.get_mut(current) {
                animation.pause();
            }
        }
        true
    }

    /// 暂停当前动画
    pub fn pause_animator(&mut self, id: AnimatorId) -> bool {
        self.with_current_animation(id, SpriteAnimationState::pause)
    }

    /// 恢复当前动画
    pub fn resume_animator(&mut self, id: AnimatorId) -> bool {
        self.with_current_animation(id, SpriteAnimationState::resume)
    }

    fn with_current_animation(
        &mut self,
        id: AnimatorId,
        f: impl FnOnce(&mut SpriteAnimationState<H::Value>),
    ) -> bool {
        let Some(current) = self.animators.get(id).map(AnimatorState::current_animation) else {
            self.stale("animator", id);
            return false;
        };
        if let Some(animation) =
            current.and_then(|current| self.sprite_animations.get_mut(current))
        {
            f(animation);
        }
        true
    }

    /// 设置命名动画的完成回调，传 `None` 清除
    ///
    /// 回调可以先于 `add_animation` 登记。
    pub fn on_animation_complete(
        &mut self,
        host: &mut H,
        id: AnimatorId,
        name: &str,
        callback: Option<H::Value>,
    ) -> bool {
        let Some(animator) = self.animators.get_mut(id) else {
            return false;
        };
        let previous = match callback {
            Some(callback) => {
                host.retain(&callback);
                animator
                    .on_complete_callbacks
                    .insert(name.to_string(), callback)
            }
            None => animator.on_complete_callbacks.remove(name),
        };
        if let Some(previous) = previous {
            host.release(&previous);
        }
        true
    }

    // ========== 查询 ==========

    /// 当前动画是否在播放
    pub fn is_animator_playing(&self, id: AnimatorId) -> bool {
        self.animators
            .get(id)
            .and_then(AnimatorState::current_animation)
            .and_then(|current| self.sprite_animations.get(current))
            .is_some_and(SpriteAnimationState::is_playing)
    }

    /// 查询动画控制器状态
    pub fn animator(&self, id: AnimatorId) -> Option<&AnimatorState<H::Value>> {
        self.animators.get(id)
    }

    /// 存活动画控制器数量
    pub fn animator_count(&self) -> usize {
        self.animators.len()
    }

    // ========== 帧动画通知 ==========

    /// 控制器拥有的动画自然结束：触发命名回调，然后开始排队的动画
    pub(super) fn owned_animation_completed(
        &mut self,
        host: &mut H,
        id: AnimatorId,
        animation_id: SpriteAnimationId,
    ) -> AnimResult<()> {
        let Some(animator) = self.animators.get(id) else {
            return Ok(());
        };
        if animator.current_animation() != Some(animation_id) {
            return Ok(());
        }
        let callback = animator
            .current()
            .and_then(|name| animator.on_complete_callbacks.get(name))
            .cloned();

        let result = match callback {
            Some(callback) => self.invoke(host, &callback, &[]).map(|_| ()),
            None => Ok(()),
        };
        self.start_queued(host, id);
        result
    }

    /// 循环动画绕回第一帧：有排队的动画就在这里切换
    pub(super) fn owned_animation_wrapped(
        &mut self,
        host: &mut H,
        id: AnimatorId,
        animation_id: SpriteAnimationId,
    ) {
        let is_current = self
            .animators
            .get(id)
            .is_some_and(|animator| animator.current_animation() == Some(animation_id));
        if is_current {
            self.start_queued(host, id);
        }
    }

    fn start_queued(&mut self, host: &mut H, id: AnimatorId) {
        let queued = self
            .animators
            .get_mut(id)
            .and_then(|animator| animator.queued.take());
        if let Some(name) = queued {
            self.switch_animation(host, id, &name);
        }
    }
}
