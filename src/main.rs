use anyhow::Result;
use clap::Parser;
use console::style;
use dashcam_merger::cli::Cli;
use dashcam_merger::component::VideoMerger;
use dashcam_merger::config::Config;
use dashcam_merger::init;
use dashcam_merger::signal::setup_shutdown_signal;
use dashcam_merger::tools::check_ffmpeg;
use log::info;

fn main() {
    init::init();
    match run() {
        Ok(success) => {
            if !success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {e:#}", style("錯誤:").red().bold());
            std::process::exit(1);
        }
    }
}

/// 回傳整體是否視為成功（沒有嘗試任何群組也算成功）
fn run() -> Result<bool> {
    let cli = Cli::parse();
    let shutdown_signal = setup_shutdown_signal();

    let config = Config::load(&cli.config)?;
    config.ensure_output_dir()?;

    let version = check_ffmpeg()?;
    info!("ffmpeg 檢查通過: {version}");

    let merger = VideoMerger::new(config, shutdown_signal);
    let report = merger.run(cli.date, !cli.no_info)?;
    Ok(report.attempted == 0 || report.succeeded > 0)
}
