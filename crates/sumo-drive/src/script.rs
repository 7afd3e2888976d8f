//! 非阻塞脚本驱动
//!
//! 把一串「目标 + 持续时间」的步骤按时间推进，用于无遥控环境下的
//! 行驶验证。每一步直接落到 `set_target` 级别（不经过整形曲线），
//! neutral 作为显式步骤出现，确保 ESC 收到「硬 neutral」。
//!
//! `tick()` 只做时刻比较，永不阻塞；新步骤开始时返回该步的目标对。

/// 脚本中的一步
#[derive(Debug, Clone, Copy)]
pub struct ScriptStep {
    /// 左履带目标（−100..100）
    pub left: i8,
    /// 右履带目标（−100..100）
    pub right: i8,
    /// 本步持续时长（ms）
    pub duration_ms: u32,
}

/// 按步推进的驱动脚本
#[derive(Debug, Clone)]
pub struct DriveScript {
    steps: Vec<ScriptStep>,
    idx: usize,
    step_started: u32,
    running: bool,
}

impl DriveScript {
    /// 用给定步骤创建脚本（未启动）
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            idx: 0,
            step_started: 0,
            running: false,
        }
    }

    /// 内置验证脚本：前进 → neutral → 倒车 → neutral
    pub fn exercise() -> Self {
        Self::new(vec![
            ScriptStep {
                left: 50,
                right: 50,
                duration_ms: 3000,
            },
            ScriptStep {
                left: 0,
                right: 0,
                duration_ms: 600,
            },
            ScriptStep {
                left: -50,
                right: -50,
                duration_ms: 3000,
            },
            ScriptStep {
                left: 0,
                right: 0,
                duration_ms: 300,
            },
        ])
    }

    /// 启动脚本，返回第一步的目标对；空脚本返回 None 且不进入运行态
    pub fn start(&mut self, now: u32) -> Option<(i8, i8)> {
        if self.steps.is_empty() {
            self.running = false;
            return None;
        }
        self.idx = 0;
        self.step_started = now;
        self.running = true;
        let step = self.steps[0];
        Some((step.left, step.right))
    }

    /// 推进脚本：当前步骤到时则切到下一步并返回其目标对；
    /// 走完最后一步时返回 `(0, 0)` 并停止
    pub fn tick(&mut self, now: u32) -> Option<(i8, i8)> {
        if !self.running {
            return None;
        }

        let step = self.steps[self.idx];
        if now.wrapping_sub(self.step_started) < step.duration_ms {
            return None;
        }

        self.idx += 1;
        self.step_started = now;

        if let Some(next) = self.steps.get(self.idx) {
            Some((next.left, next.right))
        } else {
            self.running = false;
            Some((0, 0))
        }
    }

    /// 脚本是否仍在运行
    pub fn is_running(&self) -> bool {
        self.running
    }
}
