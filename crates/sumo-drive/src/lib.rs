//! Sumo Drive - 履带车实时驱动控制
//!
//! 把高层操纵意图转换为安全、限速率的 ESC 命令。管线每个节拍按固定
//! 顺序执行：reverse gate → 斜坡 → EMA 平滑 → 履带补偿 → ESC 窗口
//! 映射，硬件上只会出现合法脉宽。
//!
//! # 架构设计
//!
//! 自底向上分层：
//!
//! - **ESC 层** (`sumo-esc`): 脉宽输出抽象，百分比 → 微秒映射
//! - **履带层** (`track`): 单履带状态机，承载全部安全不变量
//! - **门面层** (`tank`): 操纵请求 → 两侧履带目标
//! - **调度层** (`sched` + `runner`): 协作式、抗漂移的周期派发
//!
//! # 快速开始
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//! use sumo_drive::{DriveConfig, LoopConfig, TankDrive, run_drive_loop};
//! use sumo_esc::{EscDriver, MockPulseOutput};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DriveConfig::default();
//! let esc = EscDriver::with_default_window(MockPulseOutput::new())?;
//! let mut tank = TankDrive::new(esc, config.motors)?;
//!
//! tank.forward(60);
//!
//! let stop = AtomicBool::new(false);
//! let loop_config = LoopConfig {
//!     max_iterations: Some(100),
//!     ..Default::default()
//! };
//! run_drive_loop(&mut tank, None, None, &stop, loop_config)?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod curve;
pub mod error;
pub mod runner;
pub mod sched;
pub mod script;
pub mod stats;
pub mod tank;
pub mod track;

pub use command::DriveCommand;
pub use config::{ConfigError, CurveParams, DriveConfig, MotorConfig, SchedulerConfig};
pub use curve::ThrottleCurve;
pub use error::DriveError;
pub use runner::{LoopConfig, run_drive_loop};
pub use sched::{SoftTimer, task_due, task_prime};
pub use script::{DriveScript, ScriptStep};
pub use stats::{TickStats, TickSummary};
pub use tank::TankDrive;
pub use track::TrackState;

// ESC 层常用类型（方便下游一次性导入）
pub use sumo_esc::{EscChannel, EscDriver, EscError, PulseOutput, PulseWindow};
