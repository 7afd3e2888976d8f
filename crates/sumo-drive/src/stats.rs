//! 驱动节拍抖动统计
//!
//! 记录相邻两次驱动更新之间的实际间隔，按统计窗口给出 min/avg/max，
//! 用于诊断主循环是否被慢任务拖累。上报后窗口清零，重新累计。

/// 节拍间隔统计窗口
#[derive(Debug)]
pub struct TickStats {
    min_ms: u32,
    max_ms: u32,
    sum_ms: u64,
    count: u32,
}

impl TickStats {
    /// 创建空窗口
    pub fn new() -> Self {
        Self {
            min_ms: u32::MAX,
            max_ms: 0,
            sum_ms: 0,
            count: 0,
        }
    }

    /// 记录一次节拍间隔（ms）
    pub fn record(&mut self, interval_ms: u32) {
        self.min_ms = self.min_ms.min(interval_ms);
        self.max_ms = self.max_ms.max(interval_ms);
        self.sum_ms += u64::from(interval_ms);
        self.count += 1;
    }

    /// 当前窗口的样本数
    pub fn count(&self) -> u32 {
        self.count
    }

    /// 窗口汇总；无样本时返回 None
    pub fn summary(&self) -> Option<TickSummary> {
        if self.count == 0 {
            return None;
        }
        Some(TickSummary {
            min_ms: self.min_ms,
            avg_ms: (self.sum_ms / u64::from(self.count)) as u32,
            max_ms: self.max_ms,
        })
    }

    /// 清空窗口，开始新一轮统计
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 一个统计窗口的汇总结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// 最小间隔（ms）
    pub min_ms: u32,
    /// 平均间隔（ms，整数截断）
    pub avg_ms: u32,
    /// 最大间隔（ms）
    pub max_ms: u32,
}
