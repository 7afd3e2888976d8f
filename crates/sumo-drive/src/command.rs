//! 驱动命令
//!
//! 把操纵请求表示为值类型，方便通过通道从输入线程递给控制循环，
//! 由 [`TankDrive::apply`](crate::tank::TankDrive::apply) 统一分发。

/// 一次操纵请求；百分比参数由接收端就地夹取，越界不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveCommand {
    /// 双履带归零（neutral）
    Stop,
    /// 前进（0..100）
    Forward(i8),
    /// 后退（0..100）
    Backward(i8),
    /// 左转弯（弧线，内侧履带半速）
    TurnLeft(i8),
    /// 右转弯（弧线，内侧履带半速）
    TurnRight(i8),
    /// 原地左旋（两履带等幅反号）
    RotateLeft(i8),
    /// 原地右旋
    RotateRight(i8),
    /// 直接设置两侧目标（−100..100），唯一的低层入口
    SetTarget { left: i8, right: i8 },
}
