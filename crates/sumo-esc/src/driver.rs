//! ESC 驱动：百分比 → 微秒的映射与安全夹取
//!
//! [`EscDriver`] 包装任意 [`PulseOutput`] 后端，负责：
//!
//! - 构造时校验脉宽窗口并立即把所有通道置于 neutral（安全默认态）
//! - `write_pulse_us()` 在写入前把脉宽夹回 `[min, max]`（纵深防御：
//!   即使上游已经夹过，硬件边界上再夹一次）
//! - `write_percent()` 围绕 neutral 线性映射：-100% → min、0 → neutral、
//!   +100% → max
//! - `arm_neutral()`：整个系统中唯一故意阻塞的调用，满足 ESC 上电
//!   arming 协议；只允许在调度循环启动之前的初始化阶段使用

use std::time::Duration;

use crate::{EscChannel, EscError, PulseOutput, PulseWindow};

/// 双通道 ESC 驱动
#[derive(Debug)]
pub struct EscDriver<O: PulseOutput> {
    out: O,
    window: PulseWindow,
}

impl<O: PulseOutput> EscDriver<O> {
    /// 创建驱动并把所有通道置于 neutral
    ///
    /// # Errors
    /// - [`EscError::InvalidWindow`]：窗口不变量不成立（fatal-at-init）
    /// - 后端写入错误
    pub fn new(out: O, window: PulseWindow) -> Result<Self, EscError> {
        window.validate()?;
        let mut driver = Self { out, window };
        driver.set_neutral_all()?;
        Ok(driver)
    }

    /// 以默认 1000/1500/2000 µs 窗口创建
    pub fn with_default_window(out: O) -> Result<Self, EscError> {
        Self::new(out, PulseWindow::default())
    }

    /// 向通道写入脉宽（µs），越界值静默夹回窗口
    pub fn write_pulse_us(&mut self, ch: EscChannel, us: u16) -> Result<(), EscError> {
        let us = us.clamp(self.window.min_us, self.window.max_us);
        tracing::trace!(?ch, us, "esc pulse");
        self.out.write_us(ch, us)
    }

    /// 向通道写入百分比命令（-100..=100，越界夹取）
    ///
    /// 映射：`us = neutral + half_span * pct / 100`
    pub fn write_percent(&mut self, ch: EscChannel, pct: i8) -> Result<(), EscError> {
        let pct = pct.clamp(-100, 100) as i32;
        let half_span = self.window.half_span_us() as i32;
        let us = self.window.neutral_us as i32 + half_span * pct / 100;
        self.write_pulse_us(ch, us as u16)
    }

    /// 所有通道回到 neutral（显式停止 / 启动安全态）
    pub fn set_neutral_all(&mut self) -> Result<(), EscError> {
        for ch in EscChannel::ALL {
            self.out.write_us(ch, self.window.neutral_us)?;
        }
        Ok(())
    }

    /// ESC arming：保持 neutral 指定时长
    ///
    /// 这是唯一允许阻塞的操作，必须在调度循环启动之前、作为独立的
    /// 初始化步骤调用；绝不能出现在周期任务体内。
    pub fn arm_neutral(&mut self, hold: Duration) -> Result<(), EscError> {
        tracing::info!(hold_ms = hold.as_millis() as u64, "arming ESCs at neutral");
        self.set_neutral_all()?;
        std::thread::sleep(hold);
        tracing::info!("ESC arming done");
        Ok(())
    }

    /// 窗口下界（µs）
    pub fn min_us(&self) -> u16 {
        self.window.min_us
    }

    /// neutral 脉宽（µs）
    pub fn neutral_us(&self) -> u16 {
        self.window.neutral_us
    }

    /// 窗口上界（µs）
    pub fn max_us(&self) -> u16 {
        self.window.max_us
    }

    /// 当前窗口
    pub fn window(&self) -> PulseWindow {
        self.window
    }

    /// 取回后端（测试用）
    pub fn into_inner(self) -> O {
        self.out
    }
}
