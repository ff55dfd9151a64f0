//! # Tween 模块
//!
//! 补间动画：单个数值属性在一段时间内从起始值插值到结束值。
//!
//! 核心设计：补间只关注 f32 值的时间轴变化，属性的读写由宿主完成。
//! 推进逻辑不触发任何回调，只返回本帧的插值结果。

use crate::easing::Easing;
use crate::error::{AnimError, AnimResult};

/// 补间参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenOptions {
    /// 动画时长（秒）
    pub duration: f32,
    /// 延迟启动（秒）
    pub delay: f32,
    /// 缓动函数，`None` 使用管理器配置的默认值
    pub easing: Option<Easing>,
}

impl TweenOptions {
    /// 创建补间参数（时长是必需的）
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            delay: 0.0,
            easing: None,
        }
    }

    /// 设置延迟
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// 校验时长与延迟
    pub fn validate(&self) -> AnimResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(AnimError::InvalidDuration {
                duration: self.duration,
            });
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(AnimError::InvalidDelay { delay: self.delay });
        }
        Ok(())
    }
}

/// 一帧的插值结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenFrame {
    /// 原始进度（0.0 - 1.0，未应用缓动）
    pub t: f32,
    /// 插值后的属性值（可能越过端点）
    pub value: f32,
    /// 本帧是否到达终点
    pub finished: bool,
}

/// 补间动画状态
#[derive(Debug, Clone)]
pub struct TweenState<V> {
    /// 目标对象（同时被保持，防止宿主回收）
    pub(crate) target: V,
    pub(crate) property: String,
    start_value: f32,
    end_value: f32,
    duration: f32,
    delay: f32,
    delay_remaining: f32,
    elapsed: f32,
    easing: Easing,
    active: bool,
    paused: bool,
    completed: bool,
    pub(crate) on_update: Option<V>,
    pub(crate) on_complete: Option<V>,
}

impl<V> TweenState<V> {
    /// 创建补间
    pub fn new(
        target: V,
        property: impl Into<String>,
        start_value: f32,
        end_value: f32,
        options: TweenOptions,
        default_easing: Easing,
    ) -> AnimResult<Self> {
        options.validate()?;

        Ok(Self {
            target,
            property: property.into(),
            start_value,
            end_value,
            duration: options.duration,
            delay: options.delay,
            delay_remaining: options.delay,
            elapsed: 0.0,
            easing: options.easing.unwrap_or(default_easing),
            active: true,
            paused: false,
            completed: false,
            on_update: None,
            on_complete: None,
        })
    }

    /// 推进补间
    ///
    /// # 返回
    /// - `Some(frame)`: 本帧需要写入目标属性
    /// - `None`: 已暂停、已结束或仍在延迟中
    pub fn advance(&mut self, dt: f32) -> Option<TweenFrame> {
        if !self.active || self.paused {
            return None;
        }

        let mut step = dt;
        if self.delay_remaining > 0.0 {
            self.delay_remaining -= dt;
            if self.delay_remaining > 0.0 {
                return None;
            }
            // 延迟结束，超出部分计入本帧
            step = -self.delay_remaining;
            self.delay_remaining = 0.0;
        }

        self.elapsed += step;

        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };
        let eased = self.easing.apply(t);
        let value = self.start_value + (self.end_value - self.start_value) * eased;

        let finished = t >= 1.0;
        if finished {
            self.completed = true;
            self.active = false;
        }

        Some(TweenFrame { t, value, finished })
    }

    /// 暂停
    pub fn pause(&mut self) {
        if self.active {
            self.paused = true;
        }
    }

    /// 恢复
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// 当前进度（`elapsed / duration`，限制在 `[0, 1]`）
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return if self.completed { 1.0 } else { 0.0 };
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// 是否仍在运行（包括延迟和暂停中）
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 是否暂停
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 是否已完成
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// 是否仍在延迟中
    pub fn is_delayed(&self) -> bool {
        self.delay_remaining > 0.0
    }

    /// 目标对象
    pub fn target(&self) -> &V {
        &self.target
    }

    /// 目标属性名
    pub fn property(&self) -> &str {
        &self.property
    }

    /// 起始值
    pub fn start_value(&self) -> f32 {
        self.start_value
    }

    /// 结束值
    pub fn end_value(&self) -> f32 {
        self.end_value
    }

    /// 时长
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 延迟
    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// 缓动函数
    pub fn easing(&self) -> Easing {
        self.easing
    }
}
