//! 协作式调度：软定时器的到期判定
//!
//! 单执行上下文里没有抢占，主循环每圈用当前单调毫秒时刻逐个询问
//! 「这个任务到期了吗」。这里只有纯算术，不阻塞、不挂起、没有失败
//! 路径。
//!
//! # 抗漂移
//!
//! 到期后 `last_run` 前跳**整数个周期**（锁相到名义节拍），而不是
//! 重置到 `now`：即使某一圈被偶发拖慢，任务相位也不会逐渐后移。
//! 所有时刻运算基于 `u32` 毫秒并使用回绕安全的无符号减法，约 49.7
//! 天回绕一次也不会出错。

/// 判断任务是否到期；到期时把 `last_run` 前跳到最近的周期边界
///
/// - `period == 0` 视为「每圈都跑」：`last_run = now`，返回 true
/// - `elapsed >= period` 时 `last_run += period * (elapsed / period)`，
///   返回 true；否则返回 false
pub fn task_due(now: u32, last_run: &mut u32, period: u32) -> bool {
    if period == 0 {
        *last_run = now;
        return true;
    }
    let elapsed = now.wrapping_sub(*last_run);
    if elapsed >= period {
        *last_run = last_run.wrapping_add(period * (elapsed / period));
        true
    } else {
        false
    }
}

/// 把 `last_run` 预置为 `now - period`，让启动后的第一次判定立即到期
pub fn task_prime(now: u32, last_run: &mut u32, period: u32) {
    *last_run = if period == 0 {
        now
    } else {
        now.wrapping_sub(period)
    };
}

/// 软定时器：`(last_run, period)` 的显式持有者
///
/// 把原本散落的静态时刻变量收拢成可以多实例、可独立测试的值对象。
#[derive(Debug, Clone, Copy)]
pub struct SoftTimer {
    last_run: u32,
    period: u32,
}

impl SoftTimer {
    /// 创建并立即 prime：第一次 `is_due` 即为 true
    pub fn primed(now: u32, period: u32) -> Self {
        let mut last_run = 0;
        task_prime(now, &mut last_run, period);
        Self { last_run, period }
    }

    /// 重新 prime（例如暂停后恢复）
    pub fn prime(&mut self, now: u32) {
        task_prime(now, &mut self.last_run, self.period);
    }

    /// 到期判定（到期时内部时刻前跳到周期边界）
    pub fn is_due(&mut self, now: u32) -> bool {
        task_due(now, &mut self.last_run, self.period)
    }

    /// 名义周期（ms）
    pub fn period(&self) -> u32 {
        self.period
    }

    /// 上次对齐到的周期边界时刻
    pub fn last_run(&self) -> u32 {
        self.last_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_advances_to_period_boundary() {
        let mut last = 980;
        assert!(task_due(1000, &mut last, 20));
        assert_eq!(last, 1000);

        // 紧接着的下一圈还不到期
        assert!(!task_due(1001, &mut last, 20));
        assert_eq!(last, 1000);
    }

    #[test]
    fn test_not_due_before_period() {
        let mut last = 1000;
        assert!(!task_due(1019, &mut last, 20));
        assert!(task_due(1020, &mut last, 20));
        assert_eq!(last, 1020);
    }

    #[test]
    fn test_delayed_wakeup_snaps_not_resets() {
        // 主循环被拖了 100 ms：last 前跳 3 个整周期（相位保持），
        // 而不是被重置到 now=1000
        let mut last = 900;
        assert!(task_due(1000, &mut last, 30));
        assert_eq!(last, 990);

        // 相位锁在 900+k*30 上：下一次到期点是 1020
        assert!(!task_due(1019, &mut last, 30));
        assert!(task_due(1020, &mut last, 30));
        assert_eq!(last, 1020);
    }

    #[test]
    fn test_zero_period_always_due() {
        let mut last = 123;
        assert!(task_due(1000, &mut last, 0));
        assert_eq!(last, 1000);
        assert!(task_due(1001, &mut last, 0));
        assert_eq!(last, 1001);
    }

    #[test]
    fn test_prime_makes_first_check_due() {
        let mut last = 0;
        task_prime(500, &mut last, 100);
        assert_eq!(last, 400);
        assert!(task_due(500, &mut last, 100));
        assert_eq!(last, 500);
    }

    #[test]
    fn test_prime_zero_period() {
        let mut last = 0;
        task_prime(500, &mut last, 0);
        assert_eq!(last, 500);
    }

    #[test]
    fn test_wraparound_safe() {
        // last 在回绕点之前，now 已经回绕
        let mut last = u32::MAX - 5;
        assert!(task_due(14, &mut last, 20));
        // 前跳一个周期：MAX-5 + 20 回绕到 14
        assert_eq!(last, (u32::MAX - 5).wrapping_add(20));
        assert!(!task_due(15, &mut last, 20));
    }

    #[test]
    fn test_prime_wraparound_near_zero() {
        let mut last = 0;
        task_prime(5, &mut last, 20);
        // 5 - 20 回绕
        assert_eq!(last, 5u32.wrapping_sub(20));
        assert!(task_due(5, &mut last, 20));
    }

    #[test]
    fn test_soft_timer_wrapper() {
        let mut timer = SoftTimer::primed(1000, 50);
        assert_eq!(timer.period(), 50);
        assert!(timer.is_due(1000));
        assert!(!timer.is_due(1049));
        assert!(timer.is_due(1050));
        assert_eq!(timer.last_run(), 1050);

        timer.prime(2000);
        assert!(timer.is_due(2000));
    }
}
