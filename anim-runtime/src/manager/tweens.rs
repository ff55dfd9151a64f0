//! 补间动画的创建、控制与逐帧推进。

use tracing::debug;

use super::{AnimationManager, release_tween, replace_callback};
use crate::error::AnimResult;
use crate::handle::TweenId;
use crate::host::ScriptHost;
use crate::tween::{TweenFrame, TweenOptions, TweenState};

impl<H: ScriptHost> AnimationManager<H> {
    // ========== 创建 ==========

    /// `Tween.to`：从属性当前值补间到 `end_value`
    ///
    /// 创建时不修改目标，第一次推进时才写入。
    /// 同一 `(target, property)` 上已有的补间会被静默取消。
    pub fn tween_to(
        &mut self,
        host: &mut H,
        target: H::Value,
        property: &str,
        end_value: f32,
        options: TweenOptions,
    ) -> AnimResult<TweenId> {
        options.validate()?;
        let start_value = host.get_property(&target, property)?;
        let tween = TweenState::new(
            target,
            property,
            start_value,
            end_value,
            options,
            self.config().default_easing,
        )?;
        Ok(self.register_tween(host, tween))
    }

    /// `Tween.from`：从 `start_value` 补间回属性当前值
    ///
    /// 创建时立即把 `start_value` 写入目标，避免第一帧闪现最终值。
    pub fn tween_from(
        &mut self,
        host: &mut H,
        target: H::Value,
        property: &str,
        start_value: f32,
        options: TweenOptions,
    ) -> AnimResult<TweenId> {
        options.validate()?;
        let end_value = host.get_property(&target, property)?;
        let tween = TweenState::new(
            target,
            property,
            start_value,
            end_value,
            options,
            self.config().default_easing,
        )?;

        self.cancel_property(host, &tween.target, property);
        host.set_property(&tween.target, property, start_value)?;
        Ok(self.register_tween(host, tween))
    }

    fn register_tween(&mut self, host: &mut H, tween: TweenState<H::Value>) -> TweenId {
        self.cancel_property(host, &tween.target, &tween.property);

        host.retain(&tween.target);
        debug!(
            property = %tween.property,
            from = tween.start_value(),
            to = tween.end_value(),
            duration = tween.duration(),
            delay = tween.delay(),
            easing = %tween.easing(),
            "创建补间"
        );
        self.tweens.insert(tween)
    }

    // ========== 控制 ==========

    /// 取消补间（不触发完成回调）
    ///
    /// 句柄已失效时返回 `false`。
    pub fn cancel(&mut self, host: &mut H, id: TweenId) -> bool {
        match self.tweens.remove(id) {
            Some(tween) => {
                release_tween(host, &tween);
                true
            }
            None => {
                self.stale("tween", id);
                false
            }
        }
    }

    /// 取消全部补间，返回取消的数量
    pub fn cancel_all(&mut self, host: &mut H) -> usize {
        let tweens = self.tweens.drain();
        for tween in &tweens {
            release_tween(host, tween);
        }
        if !tweens.is_empty() {
            debug!(count = tweens.len(), "取消全部补间");
        }
        tweens.len()
    }

    /// 取消目标对象某个属性上的补间
    pub fn cancel_property(&mut self, host: &mut H, target: &H::Value, property: &str) -> usize {
        self.cancel_matching(host, |tween| {
            tween.target == *target && tween.property == property
        })
    }

    /// 取消目标对象上的全部补间
    pub fn cancel_tweens_of(&mut self, host: &mut H, target: &H::Value) -> usize {
        self.cancel_matching(host, |tween| tween.target == *target)
    }

    fn cancel_matching(
        &mut self,
        host: &mut H,
        predicate: impl Fn(&TweenState<H::Value>) -> bool,
    ) -> usize {
        let matched: Vec<TweenId> = self
            .tweens
            .iter()
            .filter(|(_, tween)| predicate(tween))
            .map(|(id, _)| id)
            .collect();

        for &id in &matched {
            if let Some(tween) = self.tweens.remove(id) {
                debug!(property = %tween.property, "取消同属性上的旧补间");
                release_tween(host, &tween);
            }
        }
        matched.len()
    }

    /// 暂停补间
    pub fn pause_tween(&mut self, id: TweenId) -> bool {
        match self.tweens.get_mut(id) {
            Some(tween) => {
                tween.pause();
                true
            }
            None => false,
        }
    }

    /// 恢复补间
    pub fn resume_tween(&mut self, id: TweenId) -> bool {
        match self.tweens.get_mut(id) {
            Some(tween) => {
                tween.resume();
                true
            }
            None => false,
        }
    }

    /// 设置逐帧回调 `on_update(t, value)`，传 `None` 清除
    pub fn on_tween_update(
        &mut self,
        host: &mut H,
        id: TweenId,
        callback: Option<H::Value>,
    ) -> bool {
        match self.tweens.get_mut(id) {
            Some(tween) => {
                replace_callback(host, &mut tween.on_update, callback);
                true
            }
            None => false,
        }
    }

    /// 设置完成回调 `on_complete()`，传 `None` 清除
    pub fn on_tween_complete(
        &mut self,
        host: &mut H,
        id: TweenId,
        callback: Option<H::Value>,
    ) -> bool {
        match self.tweens.get_mut(id) {
            Some(tween) => {
                replace_callback(host, &mut tween.on_complete, callback);
                true
            }
            None => false,
        }
    }

    // ========== 查询 ==========

    /// 查询补间状态
    pub fn tween(&self, id: TweenId) -> Option<&TweenState<H::Value>> {
        self.tweens.get(id)
    }

    /// 目标对象某个属性上的补间
    pub fn tween_for(&self, target: &H::Value, property: &str) -> Option<TweenId> {
        self.tweens
            .iter()
            .find(|(_, tween)| tween.target == *target && tween.property == property)
            .map(|(id, _)| id)
    }

    /// 存活补间数量
    pub fn tween_count(&self) -> usize {
        self.tweens.len()
    }

    // ========== 推进 ==========

    pub(super) fn update_tweens(&mut self, host: &mut H, dt: f32) -> AnimResult<()> {
        for id in self.tweens.keys() {
            let Some(tween) = self.tweens.get_mut(id) else {
                continue;
            };
            let Some(frame) = tween.advance(dt) else {
                continue;
            };

            let result = self.dispatch_tween_frame(host, id, frame);

            // 回调全部触发之后才移除；回调里可能已经取消或替换了它
            if frame.finished {
                if let Some(tween) = self.tweens.remove(id) {
                    release_tween(host, &tween);
                }
            }
            result?;
        }
        Ok(())
    }

    fn dispatch_tween_frame(
        &mut self,
        host: &mut H,
        id: TweenId,
        frame: TweenFrame,
    ) -> AnimResult<()> {
        let Some(tween) = self.tweens.get(id) else {
            return Ok(());
        };
        let target = tween.target.clone();
        let property = tween.property.clone();
        let on_update = tween.on_update.clone();

        host.set_property(&target, &property, frame.value)?;

        if let Some(callback) = on_update {
            self.invoke(host, &callback, &[frame.t.into(), frame.value.into()])?;
        }

        if frame.finished {
            // on_update 里可能已经取消了这个补间
            let on_complete = match self.tweens.get(id) {
                Some(tween) => tween.on_complete.clone(),
                None => return Ok(()),
            };
            debug!(property = %property, "补间完成");
            if let Some(callback) = on_complete {
                self.invoke(host, &callback, &[])?;
            }
        }
        Ok(())
    }
}
