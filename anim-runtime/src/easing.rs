//! # Easing 模块
//!
//! 缓动函数库，用于补间动画的时间插值。
//!
//! 输入 `t` 会被限制在 `[0, 1]`，输出不做限制：
//! back / elastic 曲线会超出 `[0, 1]`，这是曲线形状的一部分。

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnimError;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 二次缓入
    InQuad,
    /// 二次缓出
    OutQuad,
    /// 二次缓入缓出
    InOutQuad,
    /// 三次缓入
    InCubic,
    /// 三次缓出
    OutCubic,
    /// 三次缓入缓出
    InOutCubic,
    /// 四次缓入
    InQuart,
    /// 四次缓出
    OutQuart,
    /// 四次缓入缓出
    InOutQuart,
    /// 五次缓入
    InQuint,
    /// 五次缓出
    OutQuint,
    /// 五次缓入缓出
    InOutQuint,
    /// 正弦缓入
    InSine,
    /// 正弦缓出
    OutSine,
    /// 正弦缓入缓出
    InOutSine,
    /// 指数缓入
    InExpo,
    /// 指数缓出
    OutExpo,
    /// 指数缓入缓出
    InOutExpo,
    /// 圆形缓入
    InCirc,
    /// 圆形缓出
    OutCirc,
    /// 圆形缓入缓出
    InOutCirc,
    /// 回拉缓入（起点前先反向）
    InBack,
    /// 回拉缓出（终点处越过再回来）
    OutBack,
    /// 回拉缓入缓出
    InOutBack,
    /// 弹性缓入
    InElastic,
    /// 弹性缓出
    OutElastic,
    /// 弹性缓入缓出
    InOutElastic,
    /// 弹跳缓入
    InBounce,
    /// 弹跳缓出
    OutBounce,
    /// 弹跳缓入缓出
    InOutBounce,
}

impl Easing {
    /// 全部缓动函数，顺序与声明一致
    pub const ALL: [Easing; 31] = [
        Easing::Linear,
        Easing::InQuad,
        Easing::OutQuad,
        Easing::InOutQuad,
        Easing::InCubic,
        Easing::OutCubic,
        Easing::InOutCubic,
        Easing::InQuart,
        Easing::OutQuart,
        Easing::InOutQuart,
        Easing::InQuint,
        Easing::OutQuint,
        Easing::InOutQuint,
        Easing::InSine,
        Easing::OutSine,
        Easing::InOutSine,
        Easing::InExpo,
        Easing::OutExpo,
        Easing::InOutExpo,
        Easing::InCirc,
        Easing::OutCirc,
        Easing::InOutCirc,
        Easing::InBack,
        Easing::OutBack,
        Easing::InOutBack,
        Easing::InElastic,
        Easing::OutElastic,
        Easing::InOutElastic,
        Easing::InBounce,
        Easing::OutBounce,
        Easing::InOutBounce,
    ];

    /// 脚本侧使用的名称（snake_case）
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::InQuad => "in_quad",
            Easing::OutQuad => "out_quad",
            Easing::InOutQuad => "in_out_quad",
            Easing::InCubic => "in_cubic",
            Easing::OutCubic => "out_cubic",
            Easing::InOutCubic => "in_out_cubic",
            Easing::InQuart => "in_quart",
            Easing::OutQuart => "out_quart",
            Easing::InOutQuart => "in_out_quart",
            Easing::InQuint => "in_quint",
            Easing::OutQuint => "out_quint",
            Easing::InOutQuint => "in_out_quint",
            Easing::InSine => "in_sine",
            Easing::OutSine => "out_sine",
            Easing::InOutSine => "in_out_sine",
            Easing::InExpo => "in_expo",
            Easing::OutExpo => "out_expo",
            Easing::InOutExpo => "in_out_expo",
            Easing::InCirc => "in_circ",
            Easing::OutCirc => "out_circ",
            Easing::InOutCirc => "in_out_circ",
            Easing::InBack => "in_back",
            Easing::OutBack => "out_back",
            Easing::InOutBack => "in_out_back",
            Easing::InElastic => "in_elastic",
            Easing::OutElastic => "out_elastic",
            Easing::InOutElastic => "in_out_elastic",
            Easing::InBounce => "in_bounce",
            Easing::OutBounce => "out_bounce",
            Easing::InOutBounce => "in_out_bounce",
        }
    }

    /// 全部名称，用于错误提示
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Easing::name).collect()
    }

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度，超出 `[0, 1]` 的部分会被截断
    ///
    /// # 返回
    /// - 缓动后的进度值，可能超出 `[0, 1]`
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Easing::Linear => t,
            Easing::InQuad => t * t,
            Easing::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::InCubic => t * t * t,
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::InQuart => t.powi(4),
            Easing::OutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::InOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::InQuint => t.powi(5),
            Easing::OutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::InOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Easing::InSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::OutSine => (t * PI / 2.0).sin(),
            Easing::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * t - 10.0)
                }
            }
            Easing::OutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * t)
                }
            }
            Easing::InOutExpo => ease_in_out_expo(t),
            Easing::InCirc => 1.0 - (1.0 - t * t).sqrt(),
            Easing::OutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Easing::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
            Easing::InBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Easing::OutBack => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
            Easing::InOutBack => ease_in_out_back(t),
            Easing::InElastic => ease_in_elastic(t),
            Easing::OutElastic => ease_out_elastic(t),
            Easing::InOutElastic => ease_in_out_elastic(t),
            Easing::InBounce => 1.0 - ease_out_bounce(1.0 - t),
            Easing::OutBounce => ease_out_bounce(t),
            Easing::InOutBounce => {
                if t < 0.5 {
                    (1.0 - ease_out_bounce(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + ease_out_bounce(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = AnimError;

    /// 解析脚本传入的名称，允许带 `ease_` 前缀（`ease_out_back`）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let normalized = lowered.strip_prefix("ease_").unwrap_or(lowered.as_str());

        Self::ALL
            .iter()
            .copied()
            .find(|easing| easing.name() == normalized)
            .ok_or_else(|| AnimError::UnknownEasing {
                name: s.to_string(),
            })
    }
}

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;

fn ease_in_out_expo(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else if t < 0.5 {
        2.0_f32.powf(20.0 * t - 10.0) / 2.0
    } else {
        (2.0 - 2.0_f32.powf(-20.0 * t + 10.0)) / 2.0
    }
}

fn ease_in_out_back(t: f32) -> f32 {
    if t < 0.5 {
        ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
    } else {
        ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
    }
}

/// 弹性缓入
fn ease_in_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        -(2.0_f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
    }
}

/// 弹性缓出
fn ease_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

fn ease_in_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c5 = (2.0 * PI) / 4.5;
        if t < 0.5 {
            -(2.0_f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0
        } else {
            (2.0_f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0 + 1.0
        }
    }
}

/// 弹跳缓出
fn ease_out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}
