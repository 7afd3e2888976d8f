//! 单履带控制状态机
//!
//! 每条履带一个 [`TrackState`]，每个驱动节拍按**固定顺序**走一遍
//! 管线，顺序本身承载安全语义（后级默认前级已经把关）：
//!
//! 1. **Reverse gate**：命令符号越过 ±阈值翻转时，强制 neutral 停留
//!    `neutral_dwell_ms`，给 ESC 进入倒转的时间，也保护机械结构不吃
//!    瞬时反向冲击
//! 2. **斜坡**：单个节拍内 `current` 最多变化 `ramp_step_pct`
//! 3. **EMA 平滑**：`filtered = (1-α)·filtered + α·current`
//! 4. **履带补偿**：乘以本侧 trim 系数后夹回 ±100
//! 5. **窗口映射**：逻辑 0..100% 线性映射进 ESC 的有效子区间
//!    `[start..max]`，0 恒等于精确 neutral
//!
//! gate 激活期间 `current` 与 `filtered` 都被硬置 0（不走斜坡、不让
//! EMA 慢慢衰减），保证停留期内输出**恰好**为 0。

use crate::config::MotorConfig;

/// 单步斜坡：`cur` 向 `tgt` 靠近，每步至多 ±step
pub(crate) fn ramp_once(cur: &mut i8, tgt: i8, step: u8) {
    let step = i32::from(step);
    let d = (i32::from(tgt) - i32::from(*cur)).clamp(-step, step);
    *cur = (i32::from(*cur) + d) as i8;
}

/// 单步 EMA
pub(crate) fn ema_step(prev: f32, input: f32, alpha: f32) -> f32 {
    (1.0 - alpha) * prev + alpha * input
}

/// 逻辑命令 −100..+100 → ESC 窗口内的带符号百分比
///
/// 0 → 0（精确 neutral）；非零幅值线性落入 `[start..max]` 并夹边，
/// 保证 ESC 永远收不到死区以下或上限以上的命令。
pub(crate) fn map_to_window(x: i8, start_pct: u8, max_pct: u8) -> i8 {
    if x == 0 {
        return 0;
    }
    let sign: i32 = if x < 0 { -1 } else { 1 };
    let mag = i32::from(x).abs();

    let start = i32::from(start_pct);
    let max = i32::from(max_pct);
    let pct = (start + (max - start) * mag / 100).clamp(start, max);

    (sign * pct) as i8
}

/// 单履带状态
///
/// `target` 是外部意图，`current` 是斜坡后的实际命令，`filtered` 是
/// EMA 之后的浮点值；gate 字段构成 NORMAL / GATED(until) 两态机。
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackState {
    target: i8,
    current: i8,
    filtered: f32,
    gate_active: bool,
    gate_until: u32,
}

impl TrackState {
    /// 静止状态（target/current/filtered 全 0，无 gate）
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置目标（夹到 −100..100）；这是 gate/斜坡唯一观察的输入
    pub fn set_target(&mut self, pct: i8) {
        self.target = pct.clamp(-100, 100);
    }

    /// 当前目标
    pub fn target(&self) -> i8 {
        self.target
    }

    /// 斜坡后的当前命令
    pub fn current(&self) -> i8 {
        self.current
    }

    /// EMA 之后的值
    pub fn filtered(&self) -> f32 {
        self.filtered
    }

    /// gate 是否处于激活态
    pub fn is_gated(&self) -> bool {
        self.gate_active
    }

    /// gate 判定：返回本节拍实际生效的目标
    ///
    /// - gate 激活且未到期 → 0
    /// - gate 到期 → 解除，同一节拍继续做换向检测（停留期间目标再次
    ///   翻转时可立即重新 gate）
    /// - `current` 与 `target` 符号相反且都**严格**越过 ±阈值 → 激活
    ///   gate、返回 0；等于阈值不算（避免噪声在阈值上反复触发）
    fn apply_neutral_gate(&mut self, now: u32, cfg: &MotorConfig) -> i8 {
        let thr = cfg.reverse_threshold_pct as i8;

        if self.gate_active {
            if now.wrapping_sub(self.gate_until) as i32 >= 0 {
                self.gate_active = false;
            } else {
                return 0;
            }
        }

        if (self.current > thr && self.target < -thr) || (self.current < -thr && self.target > thr)
        {
            self.gate_active = true;
            self.gate_until = now.wrapping_add(cfg.neutral_dwell_ms);
            tracing::debug!(
                current = self.current,
                target = self.target,
                dwell_ms = cfg.neutral_dwell_ms,
                "reverse gate engaged"
            );
            return 0;
        }

        self.target
    }

    /// 执行一个节拍，返回窗口映射后的带符号百分比（交给 ESC 层）
    pub fn tick(&mut self, now: u32, cfg: &MotorConfig, trim_scale: f32) -> i8 {
        // 0) gate 判定
        let gated_target = self.apply_neutral_gate(now, cfg);

        // 1) 斜坡；gate 激活时硬置 0，不经过斜坡也不经过 EMA 衰减
        if self.gate_active {
            self.current = 0;
            self.filtered = 0.0;
        } else {
            ramp_once(&mut self.current, gated_target, cfg.ramp_step_pct);

            // 2) EMA 平滑（alpha = 0 表示关闭）
            let input = f32::from(self.current);
            self.filtered = if cfg.smooth_alpha > 0.0 {
                ema_step(self.filtered, input, cfg.smooth_alpha)
            } else {
                input
            };
        }

        // 3) 履带补偿
        let compensated = (self.filtered * trim_scale).clamp(-100.0, 100.0);

        // 4) 窗口映射
        map_to_window(compensated as i8, cfg.window_start_pct, cfg.window_max_pct)
    }
}
