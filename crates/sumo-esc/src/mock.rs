//! Mock 后端：无硬件环境下驱动整条控制管线
//!
//! [`MockPulseOutput`] 把每次脉宽写入记录到共享缓冲，测试通过
//! [`MockHandle`]（内部 `Arc` 克隆）在驱动被上层拿走所有权之后仍然
//! 可以断言写入序列。

use std::sync::{Arc, Mutex};

use crate::{EscChannel, EscError, PulseOutput};

/// 记录型 mock 输出
#[derive(Debug, Default)]
pub struct MockPulseOutput {
    writes: Arc<Mutex<Vec<(EscChannel, u16)>>>,
}

impl MockPulseOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得观察句柄；句柄与 mock 共享同一份写入记录
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            writes: Arc::clone(&self.writes),
        }
    }
}

impl PulseOutput for MockPulseOutput {
    fn write_us(&mut self, ch: EscChannel, us: u16) -> Result<(), EscError> {
        self.writes.lock().unwrap().push((ch, us));
        Ok(())
    }
}

/// Mock 写入记录的观察句柄
#[derive(Debug, Clone)]
pub struct MockHandle {
    writes: Arc<Mutex<Vec<(EscChannel, u16)>>>,
}

impl MockHandle {
    /// 指定通道最近一次写入的脉宽
    pub fn last_us(&self, ch: EscChannel) -> Option<u16> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|&&(c, _)| c == ch)
            .map(|&(_, us)| us)
    }

    /// 累计写入次数
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// 取走并清空全部写入记录
    pub fn take_writes(&self) -> Vec<(EscChannel, u16)> {
        std::mem::take(&mut *self.writes.lock().unwrap())
    }
}
