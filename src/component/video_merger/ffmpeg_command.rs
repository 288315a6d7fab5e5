//! ffmpeg 合併指令建構模組

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::FfmpegSettings;

/// 合併策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// 直接複製壓縮串流，快速且無損
    StreamCopy,
    /// 重新解碼再編碼，較慢但能容忍片段邊界的不相容
    Reencode,
}

impl MergeStrategy {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::StreamCopy => "串流複製",
            Self::Reencode => "重新編碼",
        }
    }
}

/// 以 concat demuxer 合併一個群組的 ffmpeg 指令
pub struct ConcatCommand {
    settings: FfmpegSettings,
    manifest_path: PathBuf,
    output_path: PathBuf,
}

impl ConcatCommand {
    #[must_use]
    pub fn new(settings: FfmpegSettings, manifest_path: &Path, output_path: &Path) -> Self {
        Self {
            settings,
            manifest_path: manifest_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
        }
    }

    /// 建構指定策略的完整指令
    #[must_use]
    pub fn build(&self, strategy: MergeStrategy) -> Command {
        match strategy {
            MergeStrategy::StreamCopy => self.build_stream_copy(),
            MergeStrategy::Reencode => self.build_reencode(),
        }
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-hide_banner",
            "-nostdin",
            "-loglevel",
            "error",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
        ]);
        cmd.arg(&self.manifest_path);
        cmd
    }

    fn build_stream_copy(&self) -> Command {
        let mut cmd = self.base_command();
        cmd.args([
            "-c:v",
            self.settings.copy_codec.video.as_str(),
            "-c:a",
            self.settings.copy_codec.audio.as_str(),
            "-avoid_negative_ts",
            "make_zero",
            "-fflags",
            "+genpts",
            "-y",
        ]);
        cmd.arg(&self.output_path);
        cmd
    }

    fn build_reencode(&self) -> Command {
        let reencode = &self.settings.reencode_settings;
        let mut cmd = self.base_command();
        cmd.args([
            "-c:v",
            reencode.video_codec.as_str(),
            "-c:a",
            reencode.audio_codec.as_str(),
            "-preset",
            reencode.preset.as_str(),
            "-crf",
            reencode.crf.as_str(),
            "-avoid_negative_ts",
            "make_zero",
            "-y",
        ]);
        cmd.arg(&self.output_path);
        cmd
    }
}
