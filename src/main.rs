// ==========================================
// 危废桶监控系统 - 读数模拟器主入口
// ==========================================
// 用法:
//   bombona-monitor                 按配置间隔持续运行 (默认 300s)
//   bombona-monitor --fast          30s 间隔
//   bombona-monitor --once          只执行一次 tick
//   bombona-monitor --interval 60   自定义间隔
//   bombona-monitor --db ./x.db     指定数据库
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};

use bombona_monitor::app::{get_default_db_path, AppState, SimulatorService};
use bombona_monitor::engine::RandomReadingSource;

/// --fast 对应的间隔 (秒)
const FAST_INTERVAL_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    bombona_monitor::logging::init();

    let matches = Command::new("bombona-monitor")
        .version(bombona_monitor::VERSION)
        .about("危废桶读数模拟器: 周期性生成读数并驱动状态与告警")
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("PATH")
                .help("数据库路径 (默认: BOMBONA_MONITOR_DB_PATH 或用户数据目录)"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .value_name("SECS")
                .value_parser(value_parser!(u64).range(1..))
                .help("tick 间隔秒数 (覆盖配置 sim_tick_interval_secs)"),
        )
        .arg(
            Arg::new("fast")
                .long("fast")
                .action(ArgAction::SetTrue)
                .conflicts_with("interval")
                .help("快速模式: 30 秒间隔"),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .action(ArgAction::SetTrue)
                .help("只执行一次 tick 后退出"),
        )
        .arg(
            Arg::new("auto-reset-full")
                .long("auto-reset-full")
                .action(ArgAction::SetTrue)
                .help("每个 tick 后复位已满容器 (模拟收运)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("随机种子 (可复现)"),
        )
        .get_matches();

    let db_path = matches
        .get_one::<String>("db")
        .cloned()
        .unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} - 读数模拟器", bombona_monitor::APP_NAME);
    tracing::info!("系统版本: {}", bombona_monitor::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    let settings = state.simulator_settings().map_err(anyhow::Error::msg)?;

    let interval_secs = if matches.get_flag("fast") {
        FAST_INTERVAL_SECS
    } else {
        matches
            .get_one::<u64>("interval")
            .copied()
            .unwrap_or(settings.tick_interval_secs)
    };

    let source = match matches.get_one::<u64>("seed") {
        Some(seed) => RandomReadingSource::with_seed(settings, *seed),
        None => RandomReadingSource::new(settings),
    };
    let simulator = SimulatorService::new(state.monitor_api.clone(), Box::new(source));
    let auto_reset_full = matches.get_flag("auto-reset-full");

    if matches.get_flag("once") {
        run_once(&state, &simulator, auto_reset_full).await?;
        return Ok(());
    }

    tracing::info!(interval_secs, auto_reset_full, "模拟器启动, Ctrl+C 退出");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = run_once(&state, &simulator, auto_reset_full).await {
                    tracing::error!(error = %e, "模拟 tick 失败");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到退出信号, 模拟器停止");
                break;
            }
        }
    }

    Ok(())
}

async fn run_once(state: &AppState, simulator: &SimulatorService, auto_reset_full: bool) -> Result<()> {
    simulator.run_tick().await?;

    if auto_reset_full {
        let api = Arc::clone(&state.monitor_api);
        let count = tokio::task::spawn_blocking(move || api.reset_full_containers()).await??;
        if count > 0 {
            tracing::info!(count, "已满容器已复位");
        }
    }
    Ok(())
}
