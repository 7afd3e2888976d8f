//! 控制主循环
//!
//! 单执行上下文的协作式循环：每圈取一次单调毫秒时刻，排空命令通道
//! （`try_recv`，绝不阻塞）、推进脚本、在驱动定时器到期时执行一次
//! `update()`，再按上报定时器输出抖动统计。任何周期项都不允许阻塞，
//! 慢速辅助工作永远拖不住安全关键的驱动节拍。
//!
//! ESC arming 不属于这里：它是循环启动之前的一次性初始化步骤
//! （[`EscDriver::arm_neutral`](sumo_esc::EscDriver::arm_neutral)）。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use spin_sleep::SpinSleeper;
use sumo_esc::PulseOutput;

use crate::command::DriveCommand;
use crate::error::DriveError;
use crate::sched::SoftTimer;
use crate::script::DriveScript;
use crate::stats::TickStats;
use crate::tank::TankDrive;

/// 主循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 最大循环圈数（None = 直到 stop 标志置位）；主要用于测试和限时运行
    pub max_iterations: Option<u64>,
    /// 每圈之间的休眠粒度；决定调度分辨率
    pub granularity: Duration,
    /// 抖动统计上报周期（ms）
    pub report_ms: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            granularity: Duration::from_millis(1),
            report_ms: 200,
        }
    }
}

/// 运行控制主循环，直到 stop 置位或达到 `max_iterations`
///
/// 退出路径上无条件 `halt()`：目标归零、ESC 回 neutral，任何退出
/// 方式都落在安全态上。
pub fn run_drive_loop<O: PulseOutput>(
    tank: &mut TankDrive<O>,
    mut script: Option<DriveScript>,
    commands: Option<&Receiver<DriveCommand>>,
    stop: &AtomicBool,
    config: LoopConfig,
) -> Result<(), DriveError> {
    let epoch = Instant::now();
    let now_ms = || epoch.elapsed().as_millis() as u32;

    let start = now_ms();
    let mut drive_timer = SoftTimer::primed(start, tank.config().tick_ms);
    let mut report_timer = SoftTimer::primed(start, config.report_ms);
    let mut stats = TickStats::new();
    let mut last_update: Option<u32> = None;
    let sleeper = SpinSleeper::default();
    let mut iterations: u64 = 0;

    if let Some(s) = script.as_mut()
        && let Some((left, right)) = s.start(start)
    {
        tank.set_target(left, right);
    }

    tracing::info!(
        tick_ms = tank.config().tick_ms,
        report_ms = config.report_ms,
        "drive loop started"
    );

    while !stop.load(Ordering::Relaxed) {
        if let Some(max) = config.max_iterations
            && iterations >= max
        {
            break;
        }
        iterations += 1;

        let now = now_ms();

        // 1) 排空命令通道（非阻塞）
        if let Some(rx) = commands {
            while let Ok(cmd) = rx.try_recv() {
                tracing::debug!(?cmd, "apply drive command");
                tank.apply(cmd);
            }
        }

        // 2) 推进脚本
        if let Some(s) = script.as_mut()
            && let Some((left, right)) = s.tick(now)
        {
            tracing::debug!(left, right, "script step");
            tank.set_target(left, right);
        }

        // 3) 驱动节拍
        if drive_timer.is_due(now) {
            if let Some(prev) = last_update {
                stats.record(now.wrapping_sub(prev));
            }
            last_update = Some(now);
            tank.update(now)?;
        }

        // 4) 抖动上报
        if report_timer.is_due(now) {
            if let Some(summary) = stats.summary() {
                tracing::info!(
                    nominal_ms = tank.config().tick_ms,
                    min_ms = summary.min_ms,
                    avg_ms = summary.avg_ms,
                    max_ms = summary.max_ms,
                    ticks = stats.count() + 1,
                    "drive tick jitter"
                );
            }
            stats.reset();
        }

        sleeper.sleep(config.granularity);
    }

    tracing::info!(iterations, "drive loop stopped, forcing neutral");
    tank.halt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotorConfig;
    use crossbeam_channel::bounded;
    use sumo_esc::{EscChannel, EscDriver, MockPulseOutput};

    fn tank_with_handle() -> (TankDrive<MockPulseOutput>, sumo_esc::MockHandle) {
        let mock = MockPulseOutput::new();
        let handle = mock.handle();
        let esc = EscDriver::with_default_window(mock).unwrap();
        let tank = TankDrive::new(esc, MotorConfig::default()).unwrap();
        (tank, handle)
    }

    #[test]
    fn test_bounded_run_ticks_and_ends_neutral() {
        let (mut tank, handle) = tank_with_handle();
        tank.forward(100);

        let stop = AtomicBool::new(false);
        let config = LoopConfig {
            max_iterations: Some(200),
            ..Default::default()
        };
        run_drive_loop(&mut tank, None, None, &stop, config).unwrap();

        // ~200 ms / 20 ms 节拍 ⇒ 至少应有几次驱动更新
        let writes = handle.take_writes();
        assert!(writes.len() > 4, "writes: {}", writes.len());

        // 退出后必须落在 neutral 上
        let last_left = writes.iter().rev().find(|&&(c, _)| c == EscChannel::Left);
        let last_right = writes.iter().rev().find(|&&(c, _)| c == EscChannel::Right);
        assert_eq!(last_left.map(|&(_, us)| us), Some(1500));
        assert_eq!(last_right.map(|&(_, us)| us), Some(1500));
        assert_eq!(tank.targets(), (0, 0));
    }

    #[test]
    fn test_stop_flag_preset_exits_immediately() {
        let (mut tank, handle) = tank_with_handle();
        let stop = AtomicBool::new(true);

        run_drive_loop(&mut tank, None, None, &stop, LoopConfig::default()).unwrap();

        // 一圈都没跑，但退出路径仍写了 neutral
        let writes = handle.take_writes();
        assert!(writes.iter().all(|&(_, us)| us == 1500));
    }

    #[test]
    fn test_commands_are_drained_from_channel() {
        let (mut tank, _handle) = tank_with_handle();
        let (tx, rx) = bounded(16);
        tx.send(DriveCommand::SetTarget {
            left: -40,
            right: 40,
        })
        .unwrap();

        let stop = AtomicBool::new(false);
        let config = LoopConfig {
            max_iterations: Some(30),
            ..Default::default()
        };
        run_drive_loop(&mut tank, None, Some(&rx), &stop, config).unwrap();

        // halt() 把 target 清零了，但旋转命令在运行期间生效过：
        // 两侧 current 应当已经背向移动
        let (left, right) = tank.currents();
        assert!(left < 0, "left current: {left}");
        assert!(right > 0, "right current: {right}");
    }

    #[test]
    fn test_script_drives_targets() {
        let (mut tank, _handle) = tank_with_handle();
        let script = DriveScript::new(vec![crate::script::ScriptStep {
            left: 60,
            right: 60,
            duration_ms: 10_000,
        }]);

        let stop = AtomicBool::new(false);
        let config = LoopConfig {
            max_iterations: Some(60),
            ..Default::default()
        };
        run_drive_loop(&mut tank, Some(script), None, &stop, config).unwrap();

        let (left, right) = tank.currents();
        assert!(left > 0 && right > 0, "currents: {left},{right}");
    }
}
