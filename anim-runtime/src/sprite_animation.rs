//! # Sprite Animation 模块
//!
//! 精灵帧动画：按固定帧率在精灵表的若干帧之间循环。
//!
//! 这里只包含纯状态与时间推进逻辑；回调触发、源矩形写入由
//! `AnimationManager` 在推进之后完成。

use crate::error::{AnimError, AnimResult};
use crate::handle::AnimatorId;

/// 精灵表中的源矩形（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 精灵表网格参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheet {
    /// 每帧宽度
    pub frame_width: u32,
    /// 每帧高度
    pub frame_height: u32,
    /// 每行的帧数
    pub columns: u32,
}

impl SpriteSheet {
    /// 创建并校验精灵表参数
    pub fn new(frame_width: u32, frame_height: u32, columns: u32) -> AnimResult<Self> {
        let sheet = Self {
            frame_width,
            frame_height,
            columns,
        };
        sheet.validate()?;
        Ok(sheet)
    }

    pub(crate) fn validate(&self) -> AnimResult<()> {
        if self.columns == 0 {
            return Err(AnimError::InvalidSheet {
                message: "columns 必须大于 0".to_string(),
            });
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(AnimError::InvalidSheet {
                message: format!(
                    "帧尺寸必须大于 0，实际为 {}x{}",
                    self.frame_width, self.frame_height
                ),
            });
        }
        Ok(())
    }

    /// 帧编号 → 源矩形（按行优先排列）
    ///
    /// 矩形超出 `u32` 坐标范围时返回 `None`。
    pub fn rect_for(&self, frame: u32) -> Option<SourceRect> {
        let x = (frame % self.columns).checked_mul(self.frame_width)?;
        let y = (frame / self.columns).checked_mul(self.frame_height)?;
        x.checked_add(self.frame_width)?;
        y.checked_add(self.frame_height)?;
        Some(SourceRect {
            x,
            y,
            width: self.frame_width,
            height: self.frame_height,
        })
    }

    /// 校验帧列表中的每一帧都能映射到源矩形
    pub(crate) fn validate_frames(&self, frames: &[u32]) -> AnimResult<()> {
        match frames.iter().find(|&&frame| self.rect_for(frame).is_none()) {
            Some(&frame) => Err(AnimError::InvalidFrame {
                frame,
                frame_width: self.frame_width,
                frame_height: self.frame_height,
                columns: self.columns,
            }),
            None => Ok(()),
        }
    }
}

pub(crate) fn validate_fps(fps: f32) -> AnimResult<f32> {
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(AnimError::InvalidFps { fps })
    }
}

/// 一次推进的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameAdvance {
    /// 落点帧与推进前不同
    pub frame_changed: bool,
    /// 本次推进中首次完成（仅非循环动画）
    pub completed: bool,
    /// 本次推进中从最后一帧绕回第一帧（仅循环动画）
    pub wrapped: bool,
}

/// 精灵帧动画状态
#[derive(Debug, Clone)]
pub struct SpriteAnimationState<V> {
    /// 目标精灵（同时被保持，防止宿主回收）
    pub(crate) sprite: V,
    pub(crate) sheet: SpriteSheet,
    frames: Vec<u32>,
    fps: f32,
    frame_duration: f32,
    looping: bool,
    current_frame_index: usize,
    elapsed: f32,
    playing: bool,
    completed: bool,
    pub(crate) on_complete: Option<V>,
    pub(crate) on_frame_change: Option<V>,
    /// 所属的动画控制器及在其中的名称
    pub(crate) owner: Option<(AnimatorId, String)>,
}

impl<V> SpriteAnimationState<V> {
    /// 创建动画（初始不播放）
    pub fn new(
        sprite: V,
        sheet: SpriteSheet,
        frames: Vec<u32>,
        fps: f32,
        looping: bool,
    ) -> AnimResult<Self> {
        sheet.validate()?;
        sheet.validate_frames(&frames)?;
        let fps = validate_fps(fps)?;

        Ok(Self {
            sprite,
            sheet,
            frames,
            fps,
            frame_duration: 1.0 / fps,
            looping,
            current_frame_index: 0,
            elapsed: 0.0,
            playing: false,
            completed: false,
            on_complete: None,
            on_frame_change: None,
            owner: None,
        })
    }

    /// 推进动画
    ///
    /// 大 dt 会一次推进多帧，但只报告最终落点；非循环动画到达最后一帧后
    /// 停在最后一帧，本次推进不再继续。
    pub fn advance(&mut self, dt: f32) -> FrameAdvance {
        let mut result = FrameAdvance::default();
        if !self.playing || self.frames.is_empty() {
            return result;
        }

        let before = self.current_frame_index;
        let last = self.frames.len() - 1;
        self.elapsed += dt;

        // 循环动画跳过整圈，落点不变
        let cycle = self.frame_duration * self.frames.len() as f32;
        if self.looping && self.elapsed >= cycle * 2.0 {
            self.elapsed %= cycle;
            result.wrapped = true;
        }

        while self.elapsed >= self.frame_duration {
            self.elapsed -= self.frame_duration;

            if self.current_frame_index < last {
                self.current_frame_index += 1;
            } else if self.looping {
                self.current_frame_index = 0;
                result.wrapped = true;
            } else {
                self.current_frame_index = last;
                self.elapsed = 0.0;
                self.playing = false;
                if !self.completed {
                    self.completed = true;
                    result.completed = true;
                }
                break;
            }
        }

        result.frame_changed = self.current_frame_index != before;
        result
    }

    /// 开始播放
    ///
    /// 已完成的动画会从头开始。
    pub fn play(&mut self) {
        if self.completed {
            self.restart();
        } else {
            self.playing = true;
        }
    }

    /// 从第一帧重新开始播放
    pub fn restart(&mut self) {
        self.current_frame_index = 0;
        self.elapsed = 0.0;
        self.completed = false;
        self.playing = true;
    }

    /// 暂停（保留当前帧和计时）
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// 从暂停处继续（已完成的动画保持不动）
    pub fn resume(&mut self) {
        if !self.completed {
            self.playing = true;
        }
    }

    /// 停止并回到第一帧
    pub fn stop(&mut self) {
        self.playing = false;
        self.current_frame_index = 0;
        self.elapsed = 0.0;
    }

    /// 重置到初始状态（不播放）
    pub fn reset(&mut self) {
        self.stop();
        self.completed = false;
    }

    /// 修改帧率
    pub fn set_fps(&mut self, fps: f32) -> AnimResult<()> {
        self.fps = validate_fps(fps)?;
        self.frame_duration = 1.0 / self.fps;
        Ok(())
    }

    /// 修改是否循环
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// 是否正在播放
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// 是否已完成（非循环动画到达最后一帧）
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// 是否循环
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// 帧率
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// 当前帧在帧列表中的下标
    pub fn current_frame_index(&self) -> usize {
        self.current_frame_index
    }

    /// 当前帧编号（精灵表中的格子）
    pub fn current_frame(&self) -> Option<u32> {
        self.frames.get(self.current_frame_index).copied()
    }

    /// 帧列表
    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    /// 帧数
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// 当前帧对应的源矩形
    pub fn current_rect(&self) -> Option<SourceRect> {
        self.current_frame().and_then(|frame| self.sheet.rect_for(frame))
    }

    /// 目标精灵
    pub fn sprite(&self) -> &V {
        &self.sprite
    }

    /// 所属动画控制器
    pub fn owner(&self) -> Option<AnimatorId> {
        self.owner.as_ref().map(|(id, _)| *id)
    }
}
