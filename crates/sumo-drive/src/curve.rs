//! 油门整形曲线
//!
//! 在意图进入驱动管线之前对其做非线性整形：输入死区 → shoulder
//! 平滑衰减 → `|x|^gamma` 幂曲线 → 输出限幅。gamma > 1 把低速段压
//! 软，适合需要细腻扭矩控制的场合；shoulder 用一个 smoothstep 圆顶
//! 在指定位置附近（如半油门）做局部衰减，抑制动力总成在该区间的
//! 「窜动」。
//!
//! 曲线只作用于符号不变的幅值，0 永远映射到 0，输出对幅值单调不减。

use crate::config::{ConfigError, CurveParams};

/// 已校验的油门曲线
#[derive(Debug, Clone)]
pub struct ThrottleCurve {
    params: CurveParams,
}

/// shoulder 衰减：以 `shoulder` 为中心、半宽 0.25 的 smoothstep 圆顶
///
/// 中心处衰减 `gain`，圆顶边缘平滑归零；远离中心的区间不受影响。
fn shoulder_soften(x: f32, shoulder: f32, gain: f32) -> f32 {
    const WINDOW: f32 = 0.25;

    let dx = (x - shoulder).abs();
    if dx >= WINDOW {
        return x;
    }
    let t = 1.0 - dx / WINDOW; // 0..1，中心处为 1
    let k = gain * (t * t * (3.0 - 2.0 * t)); // smoothstep
    x * (1.0 - k)
}

impl ThrottleCurve {
    /// 创建曲线（参数校验失败即拒绝构造）
    pub fn new(params: CurveParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// 整形：输入输出都是 −100..100 的百分比
    pub fn apply(&self, pct: i8) -> i8 {
        let p = &self.params;
        let x = f32::from(pct.clamp(-100, 100)) / 100.0;

        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        let mut a = x.abs();

        // 1) 输入死区
        if a < p.deadband_pct / 100.0 {
            return 0;
        }

        // 2) shoulder 局部衰减
        if p.shoulder_gain > 0.0 {
            a = shoulder_soften(a, p.shoulder_pct / 100.0, p.shoulder_gain);
        }

        // 3) 幂曲线
        let y = a.powf(p.gamma);

        // 4) 限幅并回到百分比
        let limit = p.out_limit_pct / 100.0;
        let out = (sign * y).clamp(-limit, limit);
        (out * 100.0) as i8
    }
}
