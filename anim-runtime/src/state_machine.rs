//! # State Machine 模块
//!
//! 挂在任意宿主对象上的有限状态机。
//!
//! ## 核心概念
//!
//! - 状态有可选的进入/退出回调，以及可选的绑定动画名
//! - 切换由事件触发，可带守卫条件；同一事件的多条切换按声明顺序取第一条满足的
//! - 绑定动画的状态在进入时会让关联的 Animator 播放对应动画
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let builder = StateMachineBuilder::new(player)
//!     .state("idle", |s| s.animation("idle").on("move", "running"))
//!     .state("running", |s| {
//!         s.animation("run")
//!             .on_if("jump", "jumping", can_jump)
//!             .on("stop", "idle")
//!     })
//!     .state("jumping", |s| s.animation("jump").on("land", "idle"));
//!
//! let machine = manager.create_state_machine(&mut host, builder)?;
//! manager.trigger(&mut host, machine, "move")?;
//! ```

use std::collections::{HashMap, HashSet};

use crate::error::{AnimError, AnimResult};
use crate::handle::AnimatorId;

/// 事件触发的切换
#[derive(Debug, Clone)]
pub struct TransitionDefinition<V> {
    /// 事件名
    pub event: String,
    /// 目标状态
    pub target: String,
    /// 守卫条件（脚本回调，返回值按真假判断）
    pub guard: Option<V>,
}

/// 状态定义
#[derive(Debug, Clone)]
pub struct StateDefinition<V> {
    /// 状态名
    pub name: String,
    /// 进入时播放的动画名
    pub animation: Option<String>,
    /// 切换列表（声明顺序）
    pub transitions: Vec<TransitionDefinition<V>>,
    /// 进入回调
    pub on_enter: Option<V>,
    /// 退出回调
    pub on_exit: Option<V>,
}

impl<V> StateDefinition<V> {
    fn new(name: String) -> Self {
        Self {
            name,
            animation: None,
            transitions: Vec::new(),
            on_enter: None,
            on_exit: None,
        }
    }
}

/// 单个状态的构建器
#[derive(Debug)]
pub struct StateBuilder<V> {
    definition: StateDefinition<V>,
}

impl<V> StateBuilder<V> {
    /// 绑定动画
    pub fn animation(mut self, name: impl Into<String>) -> Self {
        self.definition.animation = Some(name.into());
        self
    }

    /// 事件 `event` 切换到 `target`
    pub fn on(mut self, event: impl Into<String>, target: impl Into<String>) -> Self {
        self.definition.transitions.push(TransitionDefinition {
            event: event.into(),
            target: target.into(),
            guard: None,
        });
        self
    }

    /// 带守卫条件的切换
    pub fn on_if(
        mut self,
        event: impl Into<String>,
        target: impl Into<String>,
        guard: V,
    ) -> Self {
        self.definition.transitions.push(TransitionDefinition {
            event: event.into(),
            target: target.into(),
            guard: Some(guard),
        });
        self
    }

    /// 进入回调
    pub fn on_enter(mut self, callback: V) -> Self {
        self.definition.on_enter = Some(callback);
        self
    }

    /// 退出回调
    pub fn on_exit(mut self, callback: V) -> Self {
        self.definition.on_exit = Some(callback);
        self
    }
}

/// 状态机构建器
#[derive(Debug)]
pub struct StateMachineBuilder<V> {
    owner: V,
    states: Vec<StateDefinition<V>>,
    initial: Option<String>,
    animator: Option<AnimatorId>,
}

impl<V> StateMachineBuilder<V> {
    /// 为 `owner` 创建状态机构建器
    pub fn new(owner: V) -> Self {
        Self {
            owner,
            states: Vec::new(),
            initial: None,
            animator: None,
        }
    }

    /// 定义状态
    pub fn state(
        mut self,
        name: impl Into<String>,
        configure: impl FnOnce(StateBuilder<V>) -> StateBuilder<V>,
    ) -> Self {
        let builder = StateBuilder {
            definition: StateDefinition::new(name.into()),
        };
        self.states.push(configure(builder).definition);
        self
    }

    /// 指定初始状态（默认是第一个定义的状态）
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// 显式关联动画控制器
    pub fn animator(mut self, animator: AnimatorId) -> Self {
        self.animator = Some(animator);
        self
    }

    /// 校验并生成状态机
    pub fn build(self) -> AnimResult<StateMachineState<V>> {
        let first = self
            .states
            .first()
            .map(|state| state.name.clone())
            .ok_or(AnimError::EmptyStateMachine)?;

        let mut index = HashMap::with_capacity(self.states.len());
        for (i, state) in self.states.iter().enumerate() {
            if index.insert(state.name.clone(), i).is_some() {
                return Err(AnimError::DuplicateState {
                    name: state.name.clone(),
                });
            }
        }

        let names: Vec<String> = self.states.iter().map(|s| s.name.clone()).collect();
        let unknown = |name: &str| AnimError::UnknownState {
            name: name.to_string(),
            available: names.clone(),
        };

        for state in &self.states {
            for transition in &state.transitions {
                if !index.contains_key(&transition.target) {
                    return Err(unknown(&transition.target));
                }
            }
        }

        let initial = self.initial.unwrap_or(first);
        if !index.contains_key(&initial) {
            return Err(unknown(&initial));
        }

        Ok(StateMachineState {
            owner: self.owner,
            states: self.states,
            index,
            current: None,
            initial,
            active: false,
            animator: self.animator,
        })
    }
}

/// 状态机状态
#[derive(Debug, Clone)]
pub struct StateMachineState<V> {
    /// 挂载对象（同时被保持，防止宿主回收）
    pub(crate) owner: V,
    states: Vec<StateDefinition<V>>,
    index: HashMap<String, usize>,
    pub(crate) current: Option<String>,
    initial: String,
    pub(crate) active: bool,
    pub(crate) animator: Option<AnimatorId>,
}

impl<V> StateMachineState<V> {
    /// 查找状态定义
    pub fn state(&self, name: &str) -> Option<&StateDefinition<V>> {
        self.index.get(name).map(|&i| &self.states[i])
    }

    /// 状态存在，否则返回带可选状态名的错误
    pub fn require_state(&self, name: &str) -> AnimResult<&StateDefinition<V>> {
        self.state(name).ok_or_else(|| AnimError::UnknownState {
            name: name.to_string(),
            available: self.state_names(),
        })
    }

    /// 全部状态名（声明顺序）
    pub fn state_names(&self) -> Vec<String> {
        self.states.iter().map(|s| s.name.clone()).collect()
    }

    /// 当前状态名
    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// 初始状态名
    pub fn initial_state(&self) -> &str {
        &self.initial
    }

    /// 是否处于指定状态
    pub fn is_in(&self, name: &str) -> bool {
        self.current.as_deref() == Some(name)
    }

    /// 是否激活（未激活时忽略事件）
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 关联的动画控制器
    pub fn animator(&self) -> Option<AnimatorId> {
        self.animator
    }

    /// 挂载对象
    pub fn owner(&self) -> &V {
        &self.owner
    }

    /// 当前状态能响应的事件（不评估守卫，按声明顺序去重）
    pub fn available_events(&self) -> Vec<String> {
        let Some(state) = self.current.as_deref().and_then(|name| self.state(name)) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        state
            .transitions
            .iter()
            .filter(|t| seen.insert(t.event.as_str()))
            .map(|t| t.event.clone())
            .collect()
    }

    /// 当前状态是否有该事件的切换（不评估守卫）
    pub fn can_trigger(&self, event: &str) -> bool {
        self.current
            .as_deref()
            .and_then(|name| self.state(name))
            .is_some_and(|state| state.transitions.iter().any(|t| t.event == event))
    }

    /// 状态机持有的全部脚本值（挂载对象与所有回调）
    pub(crate) fn script_values(&self) -> Vec<&V> {
        let mut values = vec![&self.owner];
        for state in &self.states {
            values.extend(state.on_enter.iter());
            values.extend(state.on_exit.iter());
            values.extend(state.transitions.iter().filter_map(|t| t.guard.as_ref()));
        }
        values
    }
}

impl<V: Clone> StateMachineState<V> {
    /// 当前状态下匹配事件的切换（目标, 守卫），按声明顺序
    pub(crate) fn candidates(&self, event: &str) -> Vec<(String, Option<V>)> {
        self.current
            .as_deref()
            .and_then(|name| self.state(name))
            .map(|state| {
                state
                    .transitions
                    .iter()
                    .filter(|t| t.event == event)
                    .map(|t| (t.target.clone(), t.guard.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
