//! # Animator 模块
//!
//! 动画控制器：同一精灵的一组命名帧动画，加上动画之间的切换规则。
//!
//! ## 切换规则
//!
//! - 切换表为空时，任意动画之间都可以切换
//! - 切换表非空时，只能从当前动画切换到为它登记过的目标
//! - `global_transitions` 中的动画可以从任何状态进入，不受切换表约束
//! - 尚未播放过任何动画时，可以进入任意动画
//!
//! 控制器本身不参与逐帧推进，它拥有的帧动画由管理器当作普通动画推进。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnimError, AnimResult};
use crate::handle::SpriteAnimationId;
use crate::sprite_animation::SpriteSheet;

/// 切换方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    /// 立即切换
    #[default]
    Immediate,
    /// 等当前动画播放完再切换
    FinishCurrent,
}

impl fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionMode::Immediate => f.write_str("immediate"),
            TransitionMode::FinishCurrent => f.write_str("finish_current"),
        }
    }
}

impl FromStr for TransitionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "immediate" => Ok(Self::Immediate),
            "finish_current" => Ok(Self::FinishCurrent),
            other => Err(format!(
                "未知的切换方式 '{other}'，可用值: [immediate, finish_current]"
            )),
        }
    }
}

/// 动画控制器状态
#[derive(Debug, Clone)]
pub struct AnimatorState<V> {
    /// 目标精灵（同时被保持，防止宿主回收）
    pub(crate) sprite: V,
    pub(crate) sheet: SpriteSheet,
    pub(crate) animations: BTreeMap<String, SpriteAnimationId>,
    pub(crate) current: Option<String>,
    pub(crate) queued: Option<String>,
    transitions: HashMap<String, HashSet<String>>,
    global_transitions: HashSet<String>,
    pub(crate) on_complete_callbacks: HashMap<String, V>,
}

impl<V> AnimatorState<V> {
    /// 创建空的动画控制器
    pub fn new(sprite: V, sheet: SpriteSheet) -> AnimResult<Self> {
        sheet.validate()?;
        Ok(Self {
            sprite,
            sheet,
            animations: BTreeMap::new(),
            current: None,
            queued: None,
            transitions: HashMap::new(),
            global_transitions: HashSet::new(),
            on_complete_callbacks: HashMap::new(),
        })
    }

    /// 登记允许的切换 `from -> to`
    pub fn allow_transition<I, S>(&mut self, from: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transitions
            .entry(from.to_string())
            .or_default()
            .extend(targets.into_iter().map(Into::into));
    }

    /// 登记可从任意状态进入的动画
    pub fn allow_from_any(&mut self, name: impl Into<String>) {
        self.global_transitions.insert(name.into());
    }

    /// 切换规则判定（不检查动画是否存在）
    pub fn can_transition(&self, name: &str) -> bool {
        if self.global_transitions.contains(name) || self.transitions.is_empty() {
            return true;
        }
        match &self.current {
            None => true,
            Some(current) => self
                .transitions
                .get(current)
                .is_some_and(|targets| targets.contains(name)),
        }
    }

    /// 动画存在且切换规则允许
    pub fn can_play(&self, name: &str) -> bool {
        self.animations.contains_key(name) && self.can_transition(name)
    }

    /// 查找命名动画，不存在时返回带可选名称的错误
    pub fn require(&self, name: &str) -> AnimResult<SpriteAnimationId> {
        self.animations
            .get(name)
            .copied()
            .ok_or_else(|| AnimError::UnknownAnimation {
                name: name.to_string(),
                available: self.animation_names(),
            })
    }

    /// 命名动画的句柄
    pub fn animation(&self, name: &str) -> Option<SpriteAnimationId> {
        self.animations.get(name).copied()
    }

    /// 是否有该动画
    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    /// 全部动画名（按字典序）
    pub fn animation_names(&self) -> Vec<String> {
        self.animations.keys().cloned().collect()
    }

    /// 当前动画名
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// 等待切换的动画名
    pub fn queued(&self) -> Option<&str> {
        self.queued.as_deref()
    }

    /// 当前动画的句柄
    pub fn current_animation(&self) -> Option<SpriteAnimationId> {
        self.current.as_deref().and_then(|name| self.animation(name))
    }

    /// 精灵表参数
    pub fn sheet(&self) -> SpriteSheet {
        self.sheet
    }

    /// 目标精灵
    pub fn sprite(&self) -> &V {
        &self.sprite
    }

    /// 是否登记过任何切换规则
    pub fn has_transition_rules(&self) -> bool {
        !self.transitions.is_empty()
    }
}
