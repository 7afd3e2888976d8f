//! # 驱动配置
//!
//! 所有可调参数集中在这里，逻辑模块不改写它们。配置按值注入各组件
//! 的构造函数（依赖注入），不存在全局可变实例；`validate()` 在初始化
//! 阶段一次性把关，运行期不再出现配置错误。
//!
//! 支持从 TOML 文件加载，缺省字段回落到默认值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 配置错误（fatal-at-init）
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// 驱动节拍必须大于 0
    #[error("Invalid tick_ms: {0} (must be > 0)")]
    InvalidTick(u32),

    /// 斜坡步长必须大于 0
    #[error("Invalid ramp_step_pct: {0} (must be > 0)")]
    InvalidRampStep(u8),

    /// EMA 系数必须在 [0, 1]
    #[error("Invalid smooth_alpha: {0} (must be in [0, 1])")]
    InvalidAlpha(f32),

    /// 履带补偿系数必须为正
    #[error("Invalid {side} trim scale: {value} (must be > 0)")]
    InvalidTrim { side: &'static str, value: f32 },

    /// ESC 窗口必须满足 start < max <= 100
    #[error("Invalid ESC window: start={start_pct}% max={max_pct}% (need start < max <= 100)")]
    InvalidWindow { start_pct: u8, max_pct: u8 },

    /// 换向检测阈值必须小于 100%
    #[error("Invalid reverse_threshold_pct: {0} (must be < 100)")]
    InvalidThreshold(u8),

    /// 油门曲线参数非法
    #[error("Invalid curve parameter {name}: {value}")]
    InvalidCurve { name: &'static str, value: f32 },
}

/// 驱动/履带控制参数
///
/// 默认值是实车标定过的一组（20 ms 节拍、4%/tick 斜坡、窗口 30..60%）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// 驱动更新节拍（ms）——20 ms ⇒ 50 Hz
    pub tick_ms: u32,

    /// 斜坡步长 [%/tick]，越大起步越猛
    pub ramp_step_pct: u8,

    /// EMA 平滑系数 (0..1)；0 = 关闭平滑
    pub smooth_alpha: f32,

    /// 左履带补偿系数（1.00 = 无修正）
    pub left_scale: f32,

    /// 右履带补偿系数（1.00 = 无修正）
    pub right_scale: f32,

    /// ESC「有效窗口」下界 [%]——逻辑 0..100% 映射到 [start..max]
    pub window_start_pct: u8,

    /// ESC「有效窗口」上界 [%]
    pub window_max_pct: u8,

    /// 换向时强制 neutral 的停留时长（ms）
    pub neutral_dwell_ms: u32,

    /// 换向检测阈值 [%]——围绕 0% 的死区宽度，符号要越过 ±阈值才算换向
    pub reverse_threshold_pct: u8,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            ramp_step_pct: 4,
            smooth_alpha: 0.25,
            left_scale: 1.00,
            right_scale: 1.00,
            window_start_pct: 30,
            window_max_pct: 60,
            neutral_dwell_ms: 600,
            reverse_threshold_pct: 3,
        }
    }
}

impl MotorConfig {
    /// 校验参数不变量
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidTick(self.tick_ms));
        }
        if self.ramp_step_pct == 0 {
            return Err(ConfigError::InvalidRampStep(self.ramp_step_pct));
        }
        if !(0.0..=1.0).contains(&self.smooth_alpha) {
            return Err(ConfigError::InvalidAlpha(self.smooth_alpha));
        }
        if self.left_scale <= 0.0 {
            return Err(ConfigError::InvalidTrim {
                side: "left",
                value: self.left_scale,
            });
        }
        if self.right_scale <= 0.0 {
            return Err(ConfigError::InvalidTrim {
                side: "right",
                value: self.right_scale,
            });
        }
        if self.window_start_pct >= self.window_max_pct || self.window_max_pct > 100 {
            return Err(ConfigError::InvalidWindow {
                start_pct: self.window_start_pct,
                max_pct: self.window_max_pct,
            });
        }
        if self.reverse_threshold_pct >= 100 {
            return Err(ConfigError::InvalidThreshold(self.reverse_threshold_pct));
        }
        Ok(())
    }
}

/// 周期任务节拍（驱动节拍之外的周期项）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 抖动统计上报周期（ms）
    pub report_ms: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { report_ms: 200 }
    }
}

/// 油门整形曲线参数（可选）
///
/// gamma > 1 压软低速段；deadband 吃掉输入抖动；shoulder 在指定
/// 位置附近做平滑衰减（针对某些动力总成在半油门附近的「窜动」）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveParams {
    /// 幂指数，>1 压软低速段
    pub gamma: f32,
    /// 输入死区 [%]
    pub deadband_pct: f32,
    /// 输出限幅 [%]
    pub out_limit_pct: f32,
    /// shoulder 中心位置 [%]
    pub shoulder_pct: f32,
    /// shoulder 衰减强度 (0..1)；0 = 关闭
    pub shoulder_gain: f32,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            gamma: 3.0,
            deadband_pct: 5.0,
            out_limit_pct: 100.0,
            shoulder_pct: 55.0,
            shoulder_gain: 0.25,
        }
    }
}

impl CurveParams {
    /// 校验参数不变量
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gamma <= 0.0 {
            return Err(ConfigError::InvalidCurve {
                name: "gamma",
                value: self.gamma,
            });
        }
        if !(0.0..100.0).contains(&self.deadband_pct) {
            return Err(ConfigError::InvalidCurve {
                name: "deadband_pct",
                value: self.deadband_pct,
            });
        }
        if !(0.0..=100.0).contains(&self.out_limit_pct) {
            return Err(ConfigError::InvalidCurve {
                name: "out_limit_pct",
                value: self.out_limit_pct,
            });
        }
        if !(0.0..=100.0).contains(&self.shoulder_pct) {
            return Err(ConfigError::InvalidCurve {
                name: "shoulder_pct",
                value: self.shoulder_pct,
            });
        }
        if !(0.0..=1.0).contains(&self.shoulder_gain) {
            return Err(ConfigError::InvalidCurve {
                name: "shoulder_gain",
                value: self.shoulder_gain,
            });
        }
        Ok(())
    }
}

/// 顶层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// 驱动/履带参数
    pub motors: MotorConfig,

    /// 周期任务节拍
    pub scheduler: SchedulerConfig,

    /// 油门整形曲线；None = 直通
    pub curve: Option<CurveParams>,
}

impl DriveConfig {
    /// 从 TOML 文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: DriveConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验全部子配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.motors.validate()?;
        if let Some(curve) = &self.curve {
            curve.validate()?;
        }
        Ok(())
    }
}
