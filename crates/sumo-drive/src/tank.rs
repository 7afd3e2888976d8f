//! 双履带驱动门面
//!
//! [`TankDrive`] 是显式构造、显式持有的控制器对象：拥有已校验的
//! [`MotorConfig`]、两个 [`TrackState`] 和 ESC 驱动，把符号化的操纵
//! 请求翻译成两侧履带目标。没有任何全局实例，多实例与确定性单测
//! 天然成立。
//!
//! `update()` 必须由调度器按 `tick_ms` 节拍恰好每拍调用一次。

use sumo_esc::{EscChannel, EscDriver, PulseOutput};

use crate::command::DriveCommand;
use crate::config::MotorConfig;
use crate::curve::ThrottleCurve;
use crate::error::DriveError;
use crate::track::TrackState;

/// 弧线转弯的内外侧目标：内侧 ≈ 外侧的 50%
fn arc_pair(base: i8) -> (i8, i8) {
    let outer = base.clamp(0, 100);
    (outer / 2, outer)
}

/// 双履带驱动控制器
pub struct TankDrive<O: PulseOutput> {
    cfg: MotorConfig,
    curve: Option<ThrottleCurve>,
    esc: EscDriver<O>,
    left: TrackState,
    right: TrackState,
}

impl<O: PulseOutput> TankDrive<O> {
    /// 创建控制器
    ///
    /// 配置在这里一次性校验（fatal-at-init）：没有合法配置就不存在
    /// 控制器实例，运行期自然不会在未定义参数上执行节拍。构造完成
    /// 时所有通道处于 neutral。
    pub fn new(esc: EscDriver<O>, cfg: MotorConfig) -> Result<Self, DriveError> {
        cfg.validate()?;
        let mut tank = Self {
            cfg,
            curve: None,
            esc,
            left: TrackState::new(),
            right: TrackState::new(),
        };
        tank.esc.set_neutral_all()?;
        Ok(tank)
    }

    /// 挂上油门整形曲线（只影响符号化操纵，不影响 `set_target`）
    pub fn with_curve(mut self, curve: ThrottleCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    fn shape(&self, pct: i8) -> i8 {
        match &self.curve {
            Some(curve) => curve.apply(pct),
            None => pct,
        }
    }

    /// 双履带归零
    pub fn stop(&mut self) {
        self.left.set_target(0);
        self.right.set_target(0);
    }

    /// 前进（0..100，越界夹取）
    pub fn forward(&mut self, pct: i8) {
        let p = self.shape(pct.clamp(0, 100));
        self.left.set_target(p);
        self.right.set_target(p);
    }

    /// 后退（0..100，越界夹取）
    pub fn backward(&mut self, pct: i8) {
        let p = self.shape(pct.clamp(0, 100));
        self.left.set_target(-p);
        self.right.set_target(-p);
    }

    /// 左转弯：左（内侧）半速，右（外侧）全速
    pub fn turn_left(&mut self, pct: i8) {
        let (inner, outer) = arc_pair(self.shape(pct.clamp(0, 100)));
        self.left.set_target(inner);
        self.right.set_target(outer);
    }

    /// 右转弯：右（内侧）半速，左（外侧）全速
    pub fn turn_right(&mut self, pct: i8) {
        let (inner, outer) = arc_pair(self.shape(pct.clamp(0, 100)));
        self.left.set_target(outer);
        self.right.set_target(inner);
    }

    /// 原地左旋：左退右进
    pub fn rotate_left(&mut self, pct: i8) {
        let p = self.shape(pct.clamp(0, 100));
        self.left.set_target(-p);
        self.right.set_target(p);
    }

    /// 原地右旋：左进右退
    pub fn rotate_right(&mut self, pct: i8) {
        let p = self.shape(pct.clamp(0, 100));
        self.left.set_target(p);
        self.right.set_target(-p);
    }

    /// 低层入口：直接设置两侧目标（−100..100，越界夹取）
    ///
    /// gate/斜坡逻辑只认这里落下去的 target；整形曲线不作用于该入口。
    pub fn set_target(&mut self, left_pct: i8, right_pct: i8) {
        self.left.set_target(left_pct);
        self.right.set_target(right_pct);
    }

    /// 命令分发
    pub fn apply(&mut self, cmd: DriveCommand) {
        match cmd {
            DriveCommand::Stop => self.stop(),
            DriveCommand::Forward(p) => self.forward(p),
            DriveCommand::Backward(p) => self.backward(p),
            DriveCommand::TurnLeft(p) => self.turn_left(p),
            DriveCommand::TurnRight(p) => self.turn_right(p),
            DriveCommand::RotateLeft(p) => self.rotate_left(p),
            DriveCommand::RotateRight(p) => self.rotate_right(p),
            DriveCommand::SetTarget { left, right } => self.set_target(left, right),
        }
    }

    /// 执行一个驱动节拍：两侧履带各走一遍管线，然后写 ESC
    pub fn update(&mut self, now_ms: u32) -> Result<(), DriveError> {
        let out_left = self.left.tick(now_ms, &self.cfg, self.cfg.left_scale);
        let out_right = self.right.tick(now_ms, &self.cfg, self.cfg.right_scale);

        self.esc.write_percent(EscChannel::Left, out_left)?;
        self.esc.write_percent(EscChannel::Right, out_right)?;

        tracing::trace!(out_left, out_right, "drive tick");
        Ok(())
    }

    /// 立即停车：目标归零并把 ESC 直接打回 neutral（显式停止）
    pub fn halt(&mut self) -> Result<(), DriveError> {
        self.stop();
        self.esc.set_neutral_all()?;
        Ok(())
    }

    /// 两侧目标 (left, right)
    pub fn targets(&self) -> (i8, i8) {
        (self.left.target(), self.right.target())
    }

    /// 两侧斜坡后命令 (left, right)
    pub fn currents(&self) -> (i8, i8) {
        (self.left.current(), self.right.current())
    }

    /// 两侧 gate 状态 (left, right)
    pub fn gates(&self) -> (bool, bool) {
        (self.left.is_gated(), self.right.is_gated())
    }

    /// 控制器配置
    pub fn config(&self) -> &MotorConfig {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurveParams;
    use sumo_esc::MockPulseOutput;

    fn tank() -> TankDrive<MockPulseOutput> {
        let esc = EscDriver::with_default_window(MockPulseOutput::new()).unwrap();
        TankDrive::new(esc, MotorConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let esc = EscDriver::with_default_window(MockPulseOutput::new()).unwrap();
        let cfg = MotorConfig {
            tick_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            TankDrive::new(esc, cfg),
            Err(DriveError::Config(_))
        ));
    }

    #[test]
    fn test_forward_backward_targets() {
        let mut tank = tank();
        tank.forward(80);
        assert_eq!(tank.targets(), (80, 80));

        tank.backward(55);
        assert_eq!(tank.targets(), (-55, -55));
    }

    #[test]
    fn test_turn_is_inner_half_outer_full() {
        let mut tank = tank();

        // 左转：左=内侧 30，右=外侧 60
        tank.turn_left(60);
        assert_eq!(tank.targets(), (30, 60));

        tank.turn_right(60);
        assert_eq!(tank.targets(), (60, 30));
    }

    #[test]
    fn test_rotate_is_equal_and_opposite() {
        let mut tank = tank();
        tank.rotate_left(70);
        assert_eq!(tank.targets(), (-70, 70));

        tank.rotate_right(70);
        assert_eq!(tank.targets(), (70, -70));
    }

    #[test]
    fn test_maneuver_inputs_clamped() {
        let mut tank = tank();
        // 负值对单向操纵无意义 → 夹到 0
        tank.forward(-20);
        assert_eq!(tank.targets(), (0, 0));

        tank.set_target(127, -128);
        assert_eq!(tank.targets(), (100, -100));
    }

    #[test]
    fn test_apply_dispatch() {
        let mut tank = tank();
        tank.apply(DriveCommand::Forward(40));
        assert_eq!(tank.targets(), (40, 40));

        tank.apply(DriveCommand::SetTarget {
            left: -10,
            right: 90,
        });
        assert_eq!(tank.targets(), (-10, 90));

        tank.apply(DriveCommand::Stop);
        assert_eq!(tank.targets(), (0, 0));
    }

    #[test]
    fn test_curve_shapes_maneuvers_but_not_set_target() {
        let esc = EscDriver::with_default_window(MockPulseOutput::new()).unwrap();
        let curve = ThrottleCurve::new(CurveParams {
            gamma: 3.0,
            deadband_pct: 0.0,
            out_limit_pct: 100.0,
            shoulder_gain: 0.0,
            ..Default::default()
        })
        .unwrap();
        let mut tank = TankDrive::new(esc, MotorConfig::default())
            .unwrap()
            .with_curve(curve);

        // 0.5^3 = 0.125 → 12%
        tank.forward(50);
        assert_eq!(tank.targets(), (12, 12));

        // 低层入口不整形
        tank.set_target(50, 50);
        assert_eq!(tank.targets(), (50, 50));
    }

    #[test]
    fn test_halt_forces_neutral() {
        let mock = MockPulseOutput::new();
        let handle = mock.handle();
        let esc = EscDriver::with_default_window(mock).unwrap();
        let mut tank = TankDrive::new(esc, MotorConfig::default()).unwrap();

        tank.forward(100);
        let mut now = 0;
        for _ in 0..10 {
            now += 20;
            tank.update(now).unwrap();
        }
        assert_ne!(handle.last_us(EscChannel::Left), Some(1500));

        tank.halt().unwrap();
        assert_eq!(tank.targets(), (0, 0));
        assert_eq!(handle.last_us(EscChannel::Left), Some(1500));
        assert_eq!(handle.last_us(EscChannel::Right), Some(1500));
    }
}
