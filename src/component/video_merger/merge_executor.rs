//! 合併執行模組
//!
//! 對單一群組執行兩階段合併：先嘗試串流複製，失敗時改用重新編碼。
//! 啟用本機處理時會先在暫存資料夾輸出，成功後才搬到最終位置。

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use tempfile::TempDir;

use crate::component::video_merger::ffmpeg_command::{ConcatCommand, MergeStrategy};
use crate::component::video_merger::video_scanner::{VideoFile, VideoGroup};
use crate::config::{CameraId, Config};
use crate::tools::ensure_directory_exists;

/// 合併失敗的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 系統中找不到 ffmpeg
    EncoderMissing,
    /// ffmpeg 以非零狀態結束
    Encoding,
    /// 清單、暫存或搬移檔案時的 I/O 錯誤
    Filesystem,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EncoderMissing => "找不到編碼器",
            Self::Encoding => "編碼失敗",
            Self::Filesystem => "檔案系統錯誤",
        };
        f.write_str(text)
    }
}

/// 單一群組的合併失敗資訊
#[derive(Debug, Clone)]
pub struct MergeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl MergeFailure {
    fn encoder_missing() -> Self {
        Self {
            kind: FailureKind::EncoderMissing,
            message: "找不到 ffmpeg，請先安裝並確認在 PATH 中".to_string(),
        }
    }

    fn encoding(message: String) -> Self {
        Self {
            kind: FailureKind::Encoding,
            message,
        }
    }

    fn filesystem(err: &anyhow::Error) -> Self {
        Self {
            kind: FailureKind::Filesystem,
            message: format!("{err:#}"),
        }
    }
}

impl fmt::Display for MergeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// 單一群組的合併結果
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub date: NaiveDate,
    pub camera: CameraId,
    pub output_path: PathBuf,
    /// 實際成功的策略，失敗時為 None
    pub strategy: Option<MergeStrategy>,
    pub success: bool,
    pub failure: Option<MergeFailure>,
}

/// 兩階段合併的狀態機
///
/// 生命週期：NotStarted → TryStreamCopy → (TryReencode) → Succeeded 或 Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    NotStarted,
    TryStreamCopy,
    TryReencode,
    Succeeded(MergeStrategy),
    Failed,
}

impl MergeState {
    /// 開始處理群組
    #[must_use]
    pub const fn start() -> Self {
        Self::TryStreamCopy
    }

    /// 目前狀態要嘗試的策略，終止狀態回傳 None
    #[must_use]
    pub const fn strategy(&self) -> Option<MergeStrategy> {
        match self {
            Self::TryStreamCopy => Some(MergeStrategy::StreamCopy),
            Self::TryReencode => Some(MergeStrategy::Reencode),
            Self::NotStarted | Self::Succeeded(_) | Self::Failed => None,
        }
    }

    /// 依本次嘗試結果轉移到下一個狀態，終止狀態維持不變
    #[must_use]
    pub const fn advance(self, attempt_succeeded: bool) -> Self {
        match (self, attempt_succeeded) {
            (Self::NotStarted, _) => Self::TryStreamCopy,
            (Self::TryStreamCopy, true) => Self::Succeeded(MergeStrategy::StreamCopy),
            (Self::TryStreamCopy, false) => Self::TryReencode,
            (Self::TryReencode, true) => Self::Succeeded(MergeStrategy::Reencode),
            (Self::TryReencode, false) => Self::Failed,
            (state, _) => state,
        }
    }
}

/// 一個群組處理期間使用的工作路徑
///
/// 啟用暫存時清單與輸出都放在 TempDir 裡，結束時自動清掉。
struct WorkPaths {
    manifest_path: PathBuf,
    work_output: PathBuf,
    staging: Option<TempDir>,
}

/// 群組合併執行器
pub struct MergeExecutor {
    config: Config,
}

impl MergeExecutor {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 群組的最終輸出路徑，重新執行會覆寫舊檔
    #[must_use]
    pub fn output_path(&self, group: &VideoGroup) -> PathBuf {
        self.config.output_dir.join(output_file_name(group))
    }

    /// 合併一個群組
    ///
    /// 群組內的任何錯誤都會折入回傳的 [`MergeResult`]，不會中斷其他群組。
    pub fn merge(&self, group: &VideoGroup) -> MergeResult {
        let output_path = self.output_path(group);
        match self.run_group(group, &output_path) {
            Ok(strategy) => MergeResult {
                date: group.date,
                camera: group.camera.clone(),
                output_path,
                strategy: Some(strategy),
                success: true,
                failure: None,
            },
            Err(failure) => MergeResult {
                date: group.date,
                camera: group.camera.clone(),
                output_path,
                strategy: None,
                success: false,
                failure: Some(failure),
            },
        }
    }

    fn run_group(
        &self,
        group: &VideoGroup,
        output_path: &Path,
    ) -> Result<MergeStrategy, MergeFailure> {
        ensure_directory_exists(&self.config.output_dir)
            .map_err(|e| MergeFailure::filesystem(&e))?;
        let work = self
            .resolve_work_paths(group, output_path)
            .map_err(|e| MergeFailure::filesystem(&e))?;
        write_manifest(&work.manifest_path, &group.files)
            .map_err(|e| MergeFailure::filesystem(&e))?;

        let outcome = self.run_strategies(&work);
        // 暫存資料夾由 TempDir 負責清掉，直接寫輸出資料夾時要自己刪清單
        if work.staging.is_none() {
            remove_file_quiet(&work.manifest_path);
        }
        let strategy = outcome?;

        if work.staging.is_some() {
            if let Err(e) = move_file(&work.work_output, output_path) {
                remove_file_quiet(output_path);
                return Err(MergeFailure::filesystem(&e));
            }
        }
        Ok(strategy)
    }

    /// 決定清單檔與輸出檔的工作位置，兩種策略共用
    fn resolve_work_paths(&self, group: &VideoGroup, output_path: &Path) -> Result<WorkPaths> {
        let manifest_name = format!(
            "filelist_{}_{}.txt",
            group.date.format("%Y%m%d"),
            group.camera
        );

        if self.config.use_local_processing {
            let staging = tempfile::Builder::new()
                .prefix("dashcam_merge_")
                .tempdir()
                .context("無法建立本機暫存資料夾")?;
            let manifest_path = staging.path().join(&manifest_name);
            let work_output = staging.path().join(output_file_name(group));
            Ok(WorkPaths {
                manifest_path,
                work_output,
                staging: Some(staging),
            })
        } else {
            Ok(WorkPaths {
                manifest_path: self.config.output_dir.join(&manifest_name),
                work_output: output_path.to_path_buf(),
                staging: None,
            })
        }
    }

    fn run_strategies(&self, work: &WorkPaths) -> Result<MergeStrategy, MergeFailure> {
        let command = ConcatCommand::new(
            self.config.ffmpeg_settings.clone(),
            &work.manifest_path,
            &work.work_output,
        );
        let mut state = MergeState::start();
        let mut last_failure = None;

        while let Some(strategy) = state.strategy() {
            let attempt = run_attempt(&command, strategy, &work.work_output);
            let succeeded = attempt.is_ok();
            if let Err(failure) = attempt {
                remove_file_quiet(&work.work_output);
                warn!("{}失敗: {}", strategy.label(), failure.message);
                last_failure = Some(failure);
            }
            state = state.advance(succeeded);
            if state == MergeState::TryReencode {
                println!("  {}", style("串流複製失敗，改用重新編碼...").yellow());
            }
        }

        match state {
            MergeState::Succeeded(strategy) => Ok(strategy),
            _ => Err(last_failure
                .unwrap_or_else(|| MergeFailure::encoding("未知的合併失敗".to_string()))),
        }
    }
}

fn run_attempt(
    command: &ConcatCommand,
    strategy: MergeStrategy,
    output_path: &Path,
) -> Result<(), MergeFailure> {
    info!(
        "以{}策略執行 ffmpeg: {}",
        strategy.label(),
        output_path.display()
    );
    let spinner = attempt_spinner(strategy.label());
    let result = command.build(strategy).output();
    spinner.finish_and_clear();

    match result {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => Err(MergeFailure::encoding(stderr_tail(&output.stderr))),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(MergeFailure::encoder_missing()),
        Err(e) => Err(MergeFailure {
            kind: FailureKind::Filesystem,
            message: format!("無法啟動 ffmpeg: {e}"),
        }),
    }
}

fn attempt_spinner(label: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg} ({elapsed})")
            .expect("Invalid progress bar template"),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("{label}合併中..."));
    spinner
}

/// 取 stderr 的最後幾行當診斷訊息，避免洗掉整個畫面
fn stderr_tail(stderr: &[u8]) -> String {
    const MAX_LINES: usize = 8;
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(MAX_LINES);
    let tail = lines[start..].join("\n").trim().to_string();
    if tail.is_empty() {
        "ffmpeg 未輸出任何錯誤訊息".to_string()
    } else {
        tail
    }
}

/// 產生 ffmpeg concat demuxer 的檔案清單，一行一個輸入檔
fn write_manifest(path: &Path, files: &[VideoFile]) -> Result<()> {
    let mut content = String::new();
    for file in files {
        content.push_str(&format!("file '{}'\n", escape_manifest_path(&file.path)));
    }
    fs::write(path, content).with_context(|| format!("無法寫入合併清單: {}", path.display()))
}

/// concat demuxer 的單引號跳脫規則
fn escape_manifest_path(path: &Path) -> String {
    path.display().to_string().replace('\'', r"'\''")
}

/// 將檔案搬到目的地，跨檔案系統時退回複製後刪除
fn move_file(source: &Path, target: &Path) -> Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    fs::copy(source, target).with_context(|| {
        format!(
            "複製檔案失敗: {} -> {}",
            source.display(),
            target.display()
        )
    })?;
    fs::remove_file(source)
        .with_context(|| format!("刪除暫存檔案失敗: {}", source.display()))?;
    Ok(())
}

/// 刪除檔案，不存在時安靜略過
fn remove_file_quiet(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            debug!("無法刪除暫存檔案 {}: {e}", path.display());
        }
    }
}

/// 輸出檔名固定由日期與鏡頭代碼組成，重新執行會覆寫舊檔
fn output_file_name(group: &VideoGroup) -> String {
    format!(
        "merged_{}_{}.mp4",
        group.date.format("%Y-%m-%d"),
        group.camera
    )
}
