//! 集成测试用的内存宿主
//!
//! 对象是带名字的属性表，回调是 Rust 闭包；记录源矩形写入和值保持计数。

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use anim_runtime::{
    AnimError, AnimResult, AnimationManager, AnimatorId, PropertyAccessor, ScriptArg, ScriptHost,
    SourceRect, SpriteSheet,
};

pub type Manager = AnimationManager<TestHost>;

type CallbackFn = dyn Fn(&mut TestHost, &mut Manager, &[ScriptArg]) -> AnimResult<bool>;

/// 宿主对象
pub struct Object {
    pub name: String,
    props: RefCell<HashMap<String, f32>>,
}

/// 脚本值
#[derive(Clone)]
pub enum Value {
    Object(Rc<Object>),
    Callback(Rc<CallbackFn>),
}

impl Value {
    /// 读取对象属性（测试断言用）
    pub fn get(&self, property: &str) -> Option<f32> {
        match self {
            Value::Object(object) => object.props.borrow().get(property).copied(),
            Value::Callback(_) => None,
        }
    }

    /// 直接修改对象属性
    pub fn set(&self, property: &str, value: f32) {
        if let Value::Object(object) = self {
            object.props.borrow_mut().insert(property.to_string(), value);
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Value::Object(object) => &object.name,
            Value::Callback(_) => "<callback>",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Callback(a), Value::Callback(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(object) => write!(f, "Object({})", object.name),
            Value::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// 创建对象
pub fn object(name: &str, props: &[(&str, f32)]) -> Value {
    Value::Object(Rc::new(Object {
        name: name.to_string(),
        props: RefCell::new(
            props
                .iter()
                .map(|(key, value)| (key.to_string(), *value))
                .collect(),
        ),
    }))
}

/// 创建回调
pub fn callback(
    f: impl Fn(&mut TestHost, &mut Manager, &[ScriptArg]) -> AnimResult<bool> + 'static,
) -> Value {
    Value::Callback(Rc::new(f))
}

/// 计数回调：每次调用加一，返回 `true`
pub fn counter() -> (Rc<Cell<u32>>, Value) {
    let count = Rc::new(Cell::new(0));
    let handle = count.clone();
    let value = callback(move |_, _, _| {
        handle.set(handle.get() + 1);
        Ok(true)
    });
    (count, value)
}

/// 记录回调：保存每次调用的参数
pub fn recorder() -> (Rc<RefCell<Vec<Vec<ScriptArg>>>>, Value) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let handle = calls.clone();
    let value = callback(move |_, _, args| {
        handle.borrow_mut().push(args.to_vec());
        Ok(true)
    });
    (calls, value)
}

/// 固定返回值的守卫
pub fn guard(result: bool) -> Value {
    callback(move |_, _, _| Ok(result))
}

/// 测试用精灵表：32x32，每行 4 帧
pub fn sheet() -> SpriteSheet {
    SpriteSheet {
        frame_width: 32,
        frame_height: 32,
        columns: 4,
    }
}

/// 初始化日志输出（重复调用无副作用）
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// 内存宿主
#[derive(Default)]
pub struct TestHost {
    /// 源矩形写入记录（精灵名, 矩形）
    pub rects: Vec<(String, SourceRect)>,
    pub retains: usize,
    pub releases: usize,
    /// `animator_of` 的查找表（对象名 → 控制器）
    pub animators: HashMap<String, AnimatorId>,
}

impl TestHost {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    /// 精灵最后一次写入的源矩形
    pub fn last_rect(&self, sprite: &Value) -> Option<SourceRect> {
        self.rects
            .iter()
            .rev()
            .find(|(name, _)| name == sprite.name())
            .map(|(_, rect)| *rect)
    }

    /// 仍被保持的脚本值数量
    pub fn live_values(&self) -> isize {
        self.retains as isize - self.releases as isize
    }
}

impl PropertyAccessor for TestHost {
    type Value = Value;

    fn get_property(&mut self, target: &Value, property: &str) -> AnimResult<f32> {
        target
            .get(property)
            .ok_or_else(|| AnimError::property(property, format!("{} 没有这个属性", target.name())))
    }

    fn set_property(&mut self, target: &Value, property: &str, value: f32) -> AnimResult<()> {
        match target {
            Value::Object(_) => {
                target.set(property, value);
                Ok(())
            }
            Value::Callback(_) => Err(AnimError::property(property, "回调没有属性")),
        }
    }
}

impl ScriptHost for TestHost {
    fn retain(&mut self, _value: &Value) {
        self.retains += 1;
    }

    fn release(&mut self, _value: &Value) {
        self.releases += 1;
    }

    fn call(
        &mut self,
        manager: &mut Manager,
        callback: &Value,
        args: &[ScriptArg],
    ) -> AnimResult<bool> {
        match callback {
            Value::Callback(f) => {
                let f = f.clone();
                f(self, manager, args)
            }
            Value::Object(object) => Err(AnimError::callback(format!(
                "{} 不是可调用对象",
                object.name
            ))),
        }
    }

    fn set_source_rect(&mut self, sprite: &Value, rect: SourceRect) {
        self.rects.push((sprite.name().to_string(), rect));
    }

    fn animator_of(&mut self, owner: &Value) -> Option<AnimatorId> {
        self.animators.get(owner.name()).copied()
    }
}
