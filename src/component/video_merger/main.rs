//! 影片合併主模組
//!
//! 協調掃描、分組與逐群組合併的整體流程

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::NaiveDate;
use console::style;
use log::{info, warn};

use crate::component::video_merger::merge_executor::{MergeExecutor, MergeResult};
use crate::component::video_merger::video_scanner::{VideoGroup, scan_video_groups};
use crate::config::Config;

/// 一次執行的整體統計
#[derive(Debug, Default)]
pub struct MergeReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub results: Vec<MergeResult>,
}

impl MergeReport {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// 影片合併元件
pub struct VideoMerger {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl VideoMerger {
    #[must_use]
    pub fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    /// 執行完整的合併流程
    ///
    /// # Arguments
    /// * `target_date` - 有指定時只處理該日期
    /// * `show_info` - 是否顯示每個群組的檔案資訊
    pub fn run(&self, target_date: Option<NaiveDate>, show_info: bool) -> Result<MergeReport> {
        println!("{}", style("=== 行車記錄器影片合併 ===").cyan().bold());
        self.display_config_info();

        println!("{}", style("掃描影片檔案中...").dim());
        let groups = scan_video_groups(&self.config, target_date);
        if groups.is_empty() {
            match target_date {
                Some(date) => println!(
                    "{}",
                    style(format!("找不到 {} 的影片檔案", date.format("%Y-%m-%d"))).yellow()
                ),
                None => println!("{}", style("找不到任何符合樣式的影片檔案").yellow()),
            }
            return Ok(MergeReport::default());
        }

        let date_count = groups
            .iter()
            .map(|group| group.date)
            .collect::<BTreeSet<_>>()
            .len();
        println!(
            "{}",
            style(format!("找到 {} 個合併群組（{} 天）", groups.len(), date_count)).green()
        );

        let executor = MergeExecutor::new(self.config.clone());
        let mut report = MergeReport::default();
        let mut current_date: Option<NaiveDate> = None;

        for group in &groups {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                println!("{}", style("已中斷，停止處理後續群組").yellow());
                warn!(
                    "收到中斷信號，剩餘 {} 個群組未處理",
                    groups.len() - report.attempted
                );
                break;
            }

            if current_date != Some(group.date) {
                current_date = Some(group.date);
                println!();
                println!(
                    "{}",
                    style(format!("=== 日期: {} ===", group.date.format("%Y-%m-%d")))
                        .cyan()
                        .bold()
                );
            }

            println!();
            println!(
                "{}",
                style(format!(
                    "--- {} ({}) ---",
                    self.config.camera_name(&group.camera),
                    group.camera
                ))
                .cyan()
            );
            if show_info {
                display_group_info(group);
            }

            let result = executor.merge(group);
            report.attempted += 1;
            if result.success {
                report.succeeded += 1;
                let strategy_label = result.strategy.map_or("未知", |strategy| strategy.label());
                println!(
                    "  {} {} ({strategy_label})",
                    style("完成:").green().bold(),
                    result.output_path.display()
                );
                info!("合併完成: {} ({strategy_label})", result.output_path.display());
            } else if let Some(failure) = &result.failure {
                println!("  {} {failure}", style("失敗:").red().bold());
                warn!("合併失敗 {} {}: {failure}", group.date, group.camera);
            }
            report.results.push(result);
        }

        display_summary(&report);
        Ok(report)
    }

    fn display_config_info(&self) {
        println!();
        for (camera, directory) in &self.config.camera_paths {
            println!(
                "  {} {} ({camera}): {}",
                style("鏡頭").dim(),
                self.config.camera_name(camera),
                directory.display()
            );
        }
        println!(
            "  {} {}",
            style("輸出:").dim(),
            self.config.output_dir.display()
        );
        let mode = if self.config.use_local_processing {
            "本機暫存後搬移"
        } else {
            "直接寫入輸出資料夾"
        };
        println!("  {} {mode}", style("模式:").dim());
        println!();
    }
}

/// 顯示群組的檔案資訊
fn display_group_info(group: &VideoGroup) {
    let (Some(first), Some(last)) = (group.files.first(), group.files.last()) else {
        return;
    };
    println!("  {} {}", style("開始時刻:").dim(), first.name.formatted_time());
    println!("  {} {}", style("結束時刻:").dim(), last.name.formatted_time());
    println!("  {} {}", style("檔案數:").dim(), group.files.len());
    println!(
        "  {} {:.2} MB",
        style("總大小:").dim(),
        group.total_size() as f64 / 1024.0 / 1024.0
    );
}

fn display_summary(report: &MergeReport) {
    println!();
    println!("{}", style("=== 合併結果 ===").cyan().bold());
    println!(
        "  成功: {} / {} 組",
        style(report.succeeded).green(),
        report.attempted
    );
    if report.failed() > 0 {
        println!("  失敗: {} 組", style(report.failed()).red());
    }
    info!("合併結束: {}/{} 組成功", report.succeeded, report.attempted);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_failed_count() {
        let report = MergeReport {
            attempted: 3,
            succeeded: 2,
            results: Vec::new(),
        };
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_report_default_is_empty() {
        let report = MergeReport::default();
        assert_eq!(report.attempted, 0);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed(), 0);
        assert!(report.results.is_empty());
    }
}
