//! 状态机的注册、事件触发与状态切换。

use tracing::{debug, trace};

use super::AnimationManager;
use crate::animator::TransitionMode;
use crate::error::AnimResult;
use crate::handle::{AnimatorId, StateMachineId};
use crate::host::{ScriptArg, ScriptHost};
use crate::state_machine::{StateMachineBuilder, StateMachineState};

impl<H: ScriptHost> AnimationManager<H> {
    /// 注册状态机并进入初始状态
    ///
    /// 构建器没有指定动画控制器时，向宿主查询挂载对象上的控制器。
    /// 进入初始状态时的回调出错会销毁刚注册的状态机并返回错误。
    pub fn create_state_machine(
        &mut self,
        host: &mut H,
        builder: StateMachineBuilder<H::Value>,
    ) -> AnimResult<StateMachineId> {
        let mut machine = builder.build()?;
        if machine.animator.is_none() {
            machine.animator = host.animator_of(&machine.owner);
        }
        for value in machine.script_values() {
            host.retain(value);
        }
        debug!(
            states = ?machine.state_names(),
            initial = %machine.initial_state(),
            animator = ?machine.animator,
            "创建状态机"
        );

        let id = self.state_machines.insert(machine);
        if let Err(err) = self.start_state_machine(host, id) {
            self.destroy_state_machine(host, id);
            return Err(err);
        }
        Ok(id)
    }

    /// 销毁状态机，释放挂载对象与全部回调
    pub fn destroy_state_machine(&mut self, host: &mut H, id: StateMachineId) -> bool {
        let Some(machine) = self.state_machines.remove(id) else {
            self.stale("state_machine", id);
            return false;
        };
        for value in machine.script_values() {
            host.release(value);
        }
        true
    }

    /// 激活状态机；从未进入过任何状态时进入初始状态
    pub fn start_state_machine(&mut self, host: &mut H, id: StateMachineId) -> AnimResult<bool> {
        let Some(machine) = self.state_machines.get_mut(id) else {
            self.stale("state_machine", id);
            return Ok(false);
        };
        machine.active = true;
        if machine.current.is_none() {
            let initial = machine.initial_state().to_string();
            self.enter_state(host, id, &initial)?;
        }
        Ok(true)
    }

    /// 停用状态机（停用期间忽略事件）
    pub fn stop_state_machine(&mut self, id: StateMachineId) -> bool {
        match self.state_machines.get_mut(id) {
            Some(machine) => {
                machine.active = false;
                true
            }
            None => false,
        }
    }

    /// 重新绑定动画控制器，传 `None` 解除绑定
    pub fn attach_animator(&mut self, id: StateMachineId, animator: Option<AnimatorId>) -> bool {
        match self.state_machines.get_mut(id) {
            Some(machine) => {
                machine.animator = animator;
                true
            }
            None => false,
        }
    }

    /// 触发事件
    ///
    /// 按声明顺序取第一条守卫通过的切换。守卫回调改变了状态机
    /// （切换、停用或销毁）时本次触发放弃。
    ///
    /// # 返回
    /// 是否发生了切换
    pub fn trigger(&mut self, host: &mut H, id: StateMachineId, event: &str) -> AnimResult<bool> {
        let Some(machine) = self.state_machines.get(id) else {
            self.stale("state_machine", id);
            return Ok(false);
        };
        if !machine.active {
            trace!(event = %event, "状态机未激活，忽略事件");
            return Ok(false);
        }
        let Some(from) = machine.current.clone() else {
            return Ok(false);
        };

        for (target, guard) in machine.candidates(event) {
            if let Some(guard) = guard {
                let passed = self.invoke(host, &guard, &[])?;
                let unchanged = self
                    .state_machines
                    .get(id)
                    .is_some_and(|machine| machine.active && machine.is_in(&from));
                if !unchanged {
                    return Ok(false);
                }
                if !passed {
                    continue;
                }
            }
            debug!(event = %event, from = %from, to = %target, "事件触发切换");
            self.enter_state(host, id, &target)?;
            return Ok(true);
        }

        trace!(event = %event, state = %from, "没有匹配的切换");
        Ok(false)
    }

    /// 强制切换到指定状态（不经过守卫与切换表，但照常执行回调与动画绑定）
    pub fn set_state(&mut self, host: &mut H, id: StateMachineId, name: &str) -> AnimResult<bool> {
        let Some(machine) = self.state_machines.get(id) else {
            self.stale("state_machine", id);
            return Ok(false);
        };
        machine.require_state(name)?;
        self.enter_state(host, id, name)?;
        Ok(true)
    }

    /// 查询状态机状态
    pub fn state_machine(&self, id: StateMachineId) -> Option<&StateMachineState<H::Value>> {
        self.state_machines.get(id)
    }

    /// 存活状态机数量
    pub fn state_machine_count(&self) -> usize {
        self.state_machines.len()
    }

    /// 进入状态：先改写当前状态，再依次执行退出回调、进入回调、动画绑定
    ///
    /// 每个回调之后重新确认状态机仍处于 `target`，回调里的嵌套切换优先。
    fn enter_state(&mut self, host: &mut H, id: StateMachineId, target: &str) -> AnimResult<()> {
        let Some(machine) = self.state_machines.get_mut(id) else {
            return Ok(());
        };
        let previous = machine.current.replace(target.to_string());
        let on_exit = previous
            .as_deref()
            .and_then(|name| machine.state(name))
            .and_then(|state| state.on_exit.clone());
        let on_enter = machine
            .state(target)
            .and_then(|state| state.on_enter.clone());

        if let Some(callback) = on_exit {
            self.invoke(host, &callback, &[ScriptArg::from(target)])?;
            if !self.still_in(id, target) {
                return Ok(());
            }
        }

        if let Some(callback) = on_enter {
            let args: Vec<ScriptArg> = previous.into_iter().map(ScriptArg::from).collect();
            self.invoke(host, &callback, &args)?;
            if !self.still_in(id, target) {
                return Ok(());
            }
        }

        self.play_bound_animation(host, id, target)
    }

    fn still_in(&self, id: StateMachineId, state: &str) -> bool {
        self.state_machines
            .get(id)
            .is_some_and(|machine| machine.is_in(state))
    }

    fn play_bound_animation(
        &mut self,
        host: &mut H,
        id: StateMachineId,
        state: &str,
    ) -> AnimResult<()> {
        let Some(machine) = self.state_machines.get(id) else {
            return Ok(());
        };
        let Some(animator) = machine.animator else {
            return Ok(());
        };
        let Some(animation) = machine
            .state(state)
            .and_then(|definition| definition.animation.clone())
        else {
            return Ok(());
        };

        self.play(host, animator, &animation, TransitionMode::Immediate)?;
        Ok(())
    }
}
