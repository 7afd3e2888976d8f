//! # Sumo CLI
//!
//! 驱动管线的命令行台架：加载 TOML 配置、完成 ESC arming，然后在
//! mock 后端上运行控制主循环。脉宽写入用 `RUST_LOG=trace` 可见，
//! 抖动统计按配置周期输出——换真实后端之前，整条管线（gate/斜坡/
//! 窗口映射/调度）都可以在这里先行验证。
//!
//! ## 交互命令
//!
//! 循环运行期间从标准输入读取命令（专用输入线程 + 有界通道，控制
//! 循环端永不阻塞）：
//!
//! ```text
//! fwd 50      前进 50%
//! back 30     后退 30%
//! left 40     左转弯（内侧半速）
//! right 40    右转弯
//! rotl 60     原地左旋
//! rotr 60     原地右旋
//! set -20 80  直接设置左/右目标
//! stop        归零
//! exit        退出（等价 Ctrl-C）
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::{Sender, bounded};
use sumo_drive::{
    DriveCommand, DriveConfig, DriveScript, LoopConfig, TankDrive, ThrottleCurve, run_drive_loop,
};
use sumo_esc::{EscDriver, MockPulseOutput, PulseWindow};

/// Sumo CLI - 履带车驱动管线台架工具
#[derive(Parser, Debug)]
#[command(name = "sumo-cli")]
#[command(about = "Bench tool for the Sumo tank-drive control pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行控制主循环（mock ESC 后端）
    Run {
        /// TOML 配置文件；缺省用内置默认参数
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 播放内置验证脚本（前进 → neutral → 倒车 → neutral）
        #[arg(long)]
        script: bool,

        /// 限时运行（秒）；缺省一直跑到 Ctrl-C / exit
        #[arg(long)]
        seconds: Option<u64>,

        /// ESC arming 的 neutral 保持时长（ms）；0 = 跳过
        #[arg(long, default_value_t = 3000)]
        arm_ms: u64,
    },

    /// 校验配置文件并打印生效参数
    CheckConfig {
        /// TOML 配置文件路径
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sumo_cli=info".parse()?)
                .add_directive("sumo_drive=info".parse()?)
                .add_directive("sumo_esc=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            script,
            seconds,
            arm_ms,
        } => run(config, script, seconds, arm_ms),
        Commands::CheckConfig { path } => check_config(&path),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<DriveConfig> {
    match path {
        Some(p) => DriveConfig::load_from_file(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => Ok(DriveConfig::default()),
    }
}

fn run(config: Option<PathBuf>, script: bool, seconds: Option<u64>, arm_ms: u64) -> Result<()> {
    let config = load_config(config.as_ref())?;
    tracing::info!(
        tick_ms = config.motors.tick_ms,
        curve = config.curve.is_some(),
        "configuration loaded"
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;
    }

    // 初始化阶段：构造驱动并完成 arming（唯一允许阻塞的一步，
    // 必须发生在控制循环之前）
    let mut esc = EscDriver::new(MockPulseOutput::new(), PulseWindow::default())?;
    if arm_ms > 0 {
        esc.arm_neutral(Duration::from_millis(arm_ms))?;
    }

    let mut tank = TankDrive::new(esc, config.motors.clone())?;
    if let Some(params) = config.curve.clone() {
        tank = tank.with_curve(ThrottleCurve::new(params)?);
    }

    let (tx, rx) = bounded::<DriveCommand>(16);
    spawn_input_thread(tx, Arc::clone(&stop));

    let loop_config = LoopConfig {
        // 粒度 1 ms ⇒ 每秒约 1000 圈
        max_iterations: seconds.map(|s| s * 1000),
        report_ms: config.scheduler.report_ms,
        ..Default::default()
    };
    let script = script.then(DriveScript::exercise);

    run_drive_loop(&mut tank, script, Some(&rx), &stop, loop_config)?;
    tracing::info!("bench run finished");
    Ok(())
}

fn check_config(path: &PathBuf) -> Result<()> {
    let config = DriveConfig::load_from_file(path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// 专用输入线程：读 stdin、解析成 [`DriveCommand`] 后送入有界通道
fn spawn_input_thread(tx: Sender<DriveCommand>, stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        use std::io::BufRead;

        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                stop.store(true, Ordering::SeqCst);
                break;
            }
            match parse_command(line) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None => eprintln!(
                    "unknown command: {line} (try: fwd 50 | back 30 | left 40 | right 40 | \
                     rotl 60 | rotr 60 | set -20 80 | stop | exit)"
                ),
            }
        }
    });
}

/// 一行文本 → 驱动命令；百分比宽松解析后夹到 −100..100
fn parse_command(line: &str) -> Option<DriveCommand> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?.to_ascii_lowercase();

    let mut pct = || -> Option<i8> {
        let value: i16 = parts.next()?.parse().ok()?;
        Some(value.clamp(-100, 100) as i8)
    };

    let cmd = match verb.as_str() {
        "stop" | "s" => DriveCommand::Stop,
        "fwd" | "forward" => DriveCommand::Forward(pct()?),
        "back" | "backward" => DriveCommand::Backward(pct()?),
        "left" => DriveCommand::TurnLeft(pct()?),
        "right" => DriveCommand::TurnRight(pct()?),
        "rotl" => DriveCommand::RotateLeft(pct()?),
        "rotr" => DriveCommand::RotateRight(pct()?),
        "set" => {
            let left = pct()?;
            let right = pct()?;
            DriveCommand::SetTarget { left, right }
        }
        _ => return None,
    };
    Some(cmd)
}
