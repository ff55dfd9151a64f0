//! 精灵帧动画的创建、控制与逐帧推进。

use tracing::debug;

use super::{AnimationManager, release_sprite_animation, replace_callback};
use crate::error::AnimResult;
use crate::handle::SpriteAnimationId;
use crate::host::ScriptHost;
use crate::sprite_animation::{FrameAdvance, SpriteAnimationState, SpriteSheet};

impl<H: ScriptHost> AnimationManager<H> {
    /// `SpriteAnimation.new`：创建帧动画（初始不播放）
    pub fn create_sprite_animation(
        &mut self,
        host: &mut H,
        sprite: H::Value,
        sheet: SpriteSheet,
        frames: Vec<u32>,
        fps: f32,
        looping: bool,
    ) -> AnimResult<SpriteAnimationId> {
        let animation = SpriteAnimationState::new(sprite, sheet, frames, fps, looping)?;
        host.retain(&animation.sprite);
        debug!(
            frames = animation.frame_count(),
            fps = fps,
            looping = looping,
            "创建帧动画"
        );
        Ok(self.sprite_animations.insert(animation))
    }

    /// 销毁帧动画
    ///
    /// 属于动画控制器的动画会同时从控制器中移除。句柄已失效时返回 `false`。
    pub fn destroy_sprite_animation(&mut self, host: &mut H, id: SpriteAnimationId) -> bool {
        let Some(animation) = self.sprite_animations.remove(id) else {
            self.stale("sprite_animation", id);
            return false;
        };

        if let Some((animator_id, name)) = &animation.owner {
            if let Some(animator) = self.animators.get_mut(*animator_id) {
                if animator.animations.get(name) == Some(&id) {
                    animator.animations.remove(name);
                    if animator.current.as_deref() == Some(name.as_str()) {
                        animator.current = None;
                    }
                    if animator.queued.as_deref() == Some(name.as_str()) {
                        animator.queued = None;
                    }
                }
            }
        }

        release_sprite_animation(host, &animation);
        true
    }

    /// 开始播放，并立即写入当前帧的源矩形
    pub fn play_sprite_animation(&mut self, host: &mut H, id: SpriteAnimationId) -> bool {
        let Some(animation) = self.sprite_animations.get_mut(id) else {
            self.stale("sprite_animation", id);
            return false;
        };
        animation.play();
        self.write_source_rect(host, id);
        true
    }

    /// 暂停
    pub fn pause_sprite_animation(&mut self, id: SpriteAnimationId) -> bool {
        self.with_sprite_animation(id, SpriteAnimationState::pause)
    }

    /// 从暂停处继续
    pub fn resume_sprite_animation(&mut self, id: SpriteAnimationId) -> bool {
        self.with_sprite_animation(id, SpriteAnimationState::resume)
    }

    /// 停止并回到第一帧
    pub fn stop_sprite_animation(&mut self, id: SpriteAnimationId) -> bool {
        self.with_sprite_animation(id, SpriteAnimationState::stop)
    }

    /// 重置到初始状态
    pub fn reset_sprite_animation(&mut self, id: SpriteAnimationId) -> bool {
        self.with_sprite_animation(id, SpriteAnimationState::reset)
    }

    /// 修改是否循环
    pub fn set_sprite_animation_loop(&mut self, id: SpriteAnimationId, looping: bool) -> bool {
        self.with_sprite_animation(id, |animation| animation.set_looping(looping))
    }

    /// 修改帧率
    ///
    /// 非法帧率返回错误；句柄已失效时返回 `Ok(false)`。
    pub fn set_sprite_animation_fps(
        &mut self,
        id: SpriteAnimationId,
        fps: f32,
    ) -> AnimResult<bool> {
        match self.sprite_animations.get_mut(id) {
            Some(animation) => {
                animation.set_fps(fps)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn with_sprite_animation(
        &mut self,
        id: SpriteAnimationId,
        f: impl FnOnce(&mut SpriteAnimationState<H::Value>),
    ) -> bool {
        match self.sprite_animations.get_mut(id) {
            Some(animation) => {
                f(animation);
                true
            }
            None => {
                self.stale("sprite_animation", id);
                false
            }
        }
    }

    /// 设置完成回调，传 `None` 清除
    pub fn on_sprite_animation_complete(
        &mut self,
        host: &mut H,
        id: SpriteAnimationId,
        callback: Option<H::Value>,
    ) -> bool {
        match self.sprite_animations.get_mut(id) {
            Some(animation) => {
                replace_callback(host, &mut animation.on_complete, callback);
                true
            }
            None => false,
        }
    }

    /// 设置帧变化回调 `on_frame_change(frame)`，传 `None` 清除
    pub fn on_sprite_animation_frame_change(
        &mut self,
        host: &mut H,
        id: SpriteAnimationId,
        callback: Option<H::Value>,
    ) -> bool {
        match self.sprite_animations.get_mut(id) {
            Some(animation) => {
                replace_callback(host, &mut animation.on_frame_change, callback);
                true
            }
            None => false,
        }
    }

    /// 查询帧动画状态
    pub fn sprite_animation(
        &self,
        id: SpriteAnimationId,
    ) -> Option<&SpriteAnimationState<H::Value>> {
        self.sprite_animations.get(id)
    }

    /// 存活帧动画数量（包括动画控制器拥有的）
    pub fn sprite_animation_count(&self) -> usize {
        self.sprite_animations.len()
    }

    // ========== 推进 ==========

    pub(super) fn update_sprite_animations(&mut self, host: &mut H, dt: f32) -> AnimResult<()> {
        for id in self.sprite_animations.keys() {
            let Some(animation) = self.sprite_animations.get_mut(id) else {
                continue;
            };
            if !animation.is_playing() || animation.frame_count() == 0 {
                continue;
            }
            let advance = animation.advance(dt);
            self.dispatch_sprite_frame(host, id, advance)?;
        }
        Ok(())
    }

    fn dispatch_sprite_frame(
        &mut self,
        host: &mut H,
        id: SpriteAnimationId,
        advance: FrameAdvance,
    ) -> AnimResult<()> {
        let Some(animation) = self.sprite_animations.get(id) else {
            return Ok(());
        };
        let owner = animation.owner.as_ref().map(|(animator, _)| *animator);
        let on_complete = animation.on_complete.clone();

        if advance.completed {
            debug!(frame = ?animation.current_frame(), "帧动画播放完成");
            if let Some(callback) = on_complete {
                self.invoke(host, &callback, &[])?;
            }
            if let Some(animator) = owner {
                self.owned_animation_completed(host, animator, id)?;
            }
        } else if advance.wrapped {
            if let Some(animator) = owner {
                self.owned_animation_wrapped(host, animator, id);
            }
        }

        if advance.frame_changed {
            // 前面的回调可能已经销毁了它
            let Some(animation) = self.sprite_animations.get(id) else {
                return Ok(());
            };
            if let (Some(callback), Some(frame)) =
                (animation.on_frame_change.clone(), animation.current_frame())
            {
                self.invoke(host, &callback, &[frame.into()])?;
            }
        }

        self.write_source_rect(host, id);
        Ok(())
    }

    /// 把当前帧写入精灵
    ///
    /// 控制器拥有的动画只有在它仍是控制器的当前动画时才写入。
    pub(super) fn write_source_rect(&self, host: &mut H, id: SpriteAnimationId) {
        let Some(animation) = self.sprite_animations.get(id) else {
            return;
        };
        if let Some(animator) = animation.owner() {
            let displayed = self
                .animators
                .get(animator)
                .is_some_and(|animator| animator.current_animation() == Some(id));
            if !displayed {
                return;
            }
        }
        if let Some(rect) = animation.current_rect() {
            host.set_source_rect(&animation.sprite, rect);
        }
    }
}
