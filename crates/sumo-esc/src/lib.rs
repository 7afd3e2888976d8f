//! ESC 适配层核心定义
//!
//! 提供统一的脉宽输出抽象：上层控制管线只面向 [`PulseOutput`] trait 写
//! 微秒级脉宽，具体后端（定时器 PWM 外设、mock）由实现者决定。
//! 这是整个系统中唯一接触硬件寄存器的层。

use thiserror::Error;

pub mod driver;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use driver::EscDriver;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockHandle, MockPulseOutput};

/// 逻辑输出通道
///
/// 履带车只有两路 ESC。通道到具体定时器引脚的映射（例如 TIM CH1/CH4）
/// 属于后端实现，控制层只认 Left/Right。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscChannel {
    /// 左履带
    Left,
    /// 右履带
    Right,
}

impl EscChannel {
    /// 全部通道（用于 neutral-all 之类的广播操作）
    pub const ALL: [EscChannel; 2] = [EscChannel::Left, EscChannel::Right];
}

/// RC ESC 的脉宽窗口（微秒）
///
/// 设计要点：
/// - Copy trait：纯值类型，随处传递无负担
/// - 不变量：`min < neutral < max` 且关于 neutral 对称（两半行程相等），
///   否则同一个百分比在正反方向会产生不同的力
/// - 默认 1000/1500/2000 µs，即 50 Hz RC 约定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseWindow {
    /// 全速倒转脉宽
    pub min_us: u16,
    /// 停止（neutral）脉宽
    pub neutral_us: u16,
    /// 全速正转脉宽
    pub max_us: u16,
}

impl PulseWindow {
    /// 创建并校验脉宽窗口
    ///
    /// # Errors
    /// - [`EscError::InvalidWindow`]：顺序错误或不对称
    pub fn new(min_us: u16, neutral_us: u16, max_us: u16) -> Result<Self, EscError> {
        let window = Self {
            min_us,
            neutral_us,
            max_us,
        };
        window.validate()?;
        Ok(window)
    }

    /// 校验不变量：`min < neutral < max` 且两半行程相等
    pub fn validate(&self) -> Result<(), EscError> {
        if !(self.min_us < self.neutral_us && self.neutral_us < self.max_us) {
            return Err(EscError::InvalidWindow {
                min_us: self.min_us,
                neutral_us: self.neutral_us,
                max_us: self.max_us,
            });
        }
        if self.neutral_us - self.min_us != self.max_us - self.neutral_us {
            return Err(EscError::InvalidWindow {
                min_us: self.min_us,
                neutral_us: self.neutral_us,
                max_us: self.max_us,
            });
        }
        Ok(())
    }

    /// 单侧行程（µs），±100% 对应 ±half_span
    pub fn half_span_us(&self) -> u16 {
        (self.max_us - self.min_us) / 2
    }
}

impl Default for PulseWindow {
    fn default() -> Self {
        Self {
            min_us: 1000,
            neutral_us: 1500,
            max_us: 2000,
        }
    }
}

/// ESC 适配层统一错误类型
#[derive(Error, Debug)]
pub enum EscError {
    /// 底层 IO 错误（仅真实后端会产生；脉宽写入本身无重试语义）
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 脉宽窗口不满足 `min < neutral < max` 且对称的不变量
    #[error("Invalid pulse window: min={min_us}us neutral={neutral_us}us max={max_us}us")]
    InvalidWindow {
        min_us: u16,
        neutral_us: u16,
        max_us: u16,
    },

    /// 后端错误（设备未就绪、通道不可用等）
    #[error("Backend Error: {0}")]
    Backend(String),
}

/// 脉宽输出 Trait
///
/// 语义：
/// - `write_us()`: Fire-and-Forget，写入成功即返回；寄存器写入没有
///   瞬态失败一说，所以这里没有任何重试/超时策略
/// - 调用方保证 `us` 已被夹到合法窗口内（[`EscDriver`] 负责），实现
///   不必再防御
pub trait PulseOutput {
    /// 向指定通道写入一个脉宽（微秒）
    fn write_us(&mut self, ch: EscChannel, us: u16) -> Result<(), EscError>;
}
