//! # Handle 模块
//!
//! 句柄表：用不透明的整数句柄引用原生对象，与宿主的 GC 生命周期解耦。
//!
//! ## 设计说明
//!
//! - 底层使用 `slotmap`，键带版本号，销毁后旧句柄永远解析为"不存在"，
//!   即使槽位被复用也不会指向新对象
//! - 销毁是幂等的：重复销毁或销毁无效句柄都是静默的空操作
//! - 绑定层通过 [`RawHandle`]（`u64`）传递句柄，`0` 是无效哨兵值

use slotmap::{Key, KeyData, SlotMap, new_key_type};

new_key_type! {
    /// 精灵帧动画句柄
    pub struct SpriteAnimationId;
    /// 动画控制器句柄
    pub struct AnimatorId;
    /// 补间动画句柄
    pub struct TweenId;
    /// 状态机句柄
    pub struct StateMachineId;
}

/// 绑定层使用的原始句柄值
pub type RawHandle = u64;

/// 无效句柄哨兵值
pub const INVALID_HANDLE: RawHandle = 0;

/// 句柄与原始整数之间的转换
///
/// 为所有 `slotmap` 键类型自动实现。
pub trait HandleExt: Key {
    /// 转换为原始句柄，空键映射为 [`INVALID_HANDLE`]
    fn to_raw(self) -> RawHandle {
        if self.is_null() {
            INVALID_HANDLE
        } else {
            self.data().as_ffi()
        }
    }

    /// 从原始句柄恢复，[`INVALID_HANDLE`] 映射为空键
    fn from_raw(raw: RawHandle) -> Self {
        if raw == INVALID_HANDLE {
            Self::null()
        } else {
            KeyData::from_ffi(raw).into()
        }
    }
}

impl<K: Key> HandleExt for K {}

/// 句柄表
///
/// 对 `SlotMap` 的薄封装，约定了本 crate 需要的语义：
/// `get` 永不 panic，`remove` 幂等，`keys` 返回快照以便在遍历期间修改表。
#[derive(Debug)]
pub struct HandleTable<K: Key, T> {
    slots: SlotMap<K, T>,
}

impl<K: Key, T> Default for HandleTable<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, T> HandleTable<K, T> {
    /// 创建空表
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    /// 分配新槽位并返回句柄
    pub fn insert(&mut self, value: T) -> K {
        self.slots.insert(value)
    }

    /// 查询对象，句柄无效时返回 `None`
    pub fn get(&self, handle: K) -> Option<&T> {
        self.slots.get(handle)
    }

    /// 查询可变对象，句柄无效时返回 `None`
    pub fn get_mut(&mut self, handle: K) -> Option<&mut T> {
        self.slots.get_mut(handle)
    }

    /// 销毁对象
    ///
    /// 返回被移除的对象，以便调用方释放其持有的脚本值。
    /// 句柄已失效时返回 `None`，不做任何事。
    pub fn remove(&mut self, handle: K) -> Option<T> {
        self.slots.remove(handle)
    }

    /// 句柄是否仍然有效
    pub fn contains(&self, handle: K) -> bool {
        self.slots.contains_key(handle)
    }

    /// 存活对象数量
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 当前所有存活句柄的快照（按槽位顺序）
    pub fn keys(&self) -> Vec<K> {
        self.slots.keys().collect()
    }

    /// 遍历所有存活对象
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.slots.iter()
    }

    /// 移除全部对象并返回，调用方负责释放
    pub fn drain(&mut self) -> Vec<T> {
        self.slots.drain().map(|(_, value)| value).collect()
    }
}
