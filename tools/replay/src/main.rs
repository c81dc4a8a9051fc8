//! # Replay
//!
//! 无头回放工具：在虚拟时钟上播放场景文件中的整条时间线，输出最终地图状态。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p replay -- scenario.json
//! cargo run -p replay -- scenario.json --config playback.json --fps 30 --speed 2 -vv
//! cargo run -p replay -- scenario.json --list
//! ```

mod replay;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use round_player::PlaybackConfig;
use tabletop_model::Scenario;
use tracing::Level;

use crate::replay::ReplayOptions;

#[derive(Parser)]
#[command(name = "replay")]
#[command(about = "无头回放工具 - 在虚拟时钟上播放战斗时间线并输出最终地图状态")]
#[command(version)]
struct Cli {
    /// 场景文件 (JSON)
    scenario: PathBuf,

    /// 播放配置文件 (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 虚拟帧率（默认：60）
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,

    /// 覆盖场景中的播放速度
    #[arg(long)]
    speed: Option<f64>,

    /// 单个事件允许的最大帧数
    #[arg(long, default_value_t = 100_000)]
    max_frames: usize,

    /// 只列出时间线，不播放
    #[arg(long)]
    list: bool,

    /// 日志详细程度（-v info，-vv debug，-vvv trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let scenario = load_scenario(&cli.scenario)?;

    if cli.list {
        for line in replay::list(&scenario) {
            println!("{}", line);
        }
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let options = ReplayOptions {
        frame_ms: 1000.0 / f64::from(cli.fps),
        max_frames: cli.max_frames,
        speed: cli.speed,
    };

    let report = replay::run(scenario, config, &options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // 日志写到 stderr，stdout 只输出结果
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("无法读取场景文件: {}", path.display()))?;
    Scenario::from_json(&text).with_context(|| format!("场景文件格式错误: {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<PlaybackConfig> {
    let config = match path {
        Some(path) => PlaybackConfig::load(path),
        None => PlaybackConfig::default(),
    };
    config.validate().context("播放配置无效")?;
    Ok(config)
}
