//! 命令列介面定義

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// 行車記錄器影片合併工具
///
/// 掃描各鏡頭資料夾，依日期與鏡頭分組後用 ffmpeg 合併為單一影片。
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// 設定檔路徑
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        default_value = "config/config.json"
    )]
    pub config: PathBuf,

    /// 只處理指定日期（YYYYMMDD，例如 20250906）
    #[arg(
        short = 'd',
        long = "date",
        value_name = "DATE",
        value_parser = parse_target_date
    )]
    pub date: Option<NaiveDate>,

    /// 不顯示每個群組的檔案資訊
    #[arg(long = "no-info")]
    pub no_info: bool,
}

fn parse_target_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map_err(|_| format!("無效的日期格式: {raw}（請使用 YYYYMMDD，例如 20250906）"))
}
