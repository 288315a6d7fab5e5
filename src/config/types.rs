use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Result, bail};
use regex::Regex;
use serde::Deserialize;

/// 鏡頭代碼，對應檔名結尾的單一英數字元（例如 F 代表前鏡頭）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CameraId(String);

impl CameraId {
    pub fn new(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Ok(Self(raw.to_string())),
            _ => bail!("鏡頭代碼必須是單一英數字元: {raw:?}"),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 設定檔的原始結構，經過驗證後轉成 [`Config`]
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub camera_paths: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub camera_names: BTreeMap<String, String>,
    pub output_dir: PathBuf,
    pub video_pattern: String,
    pub ffmpeg_settings: FfmpegSettings,
    #[serde(default)]
    pub performance_settings: PerformanceSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FfmpegSettings {
    pub copy_codec: CopyCodecSettings,
    pub reencode_settings: ReencodeSettings,
}

/// 串流複製策略的編碼參數，通常兩者都是 "copy"
#[derive(Debug, Clone, Deserialize)]
pub struct CopyCodecSettings {
    pub video: String,
    pub audio: String,
}

/// 重新編碼策略的參數
#[derive(Debug, Clone, Deserialize)]
pub struct ReencodeSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceSettings {
    #[serde(default = "default_use_local_processing")]
    pub use_local_processing: bool,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            use_local_processing: default_use_local_processing(),
        }
    }
}

const fn default_use_local_processing() -> bool {
    true
}

/// 驗證後的執行設定
#[derive(Debug, Clone)]
pub struct Config {
    pub camera_paths: BTreeMap<CameraId, PathBuf>,
    pub camera_names: BTreeMap<CameraId, String>,
    pub output_dir: PathBuf,
    pub video_pattern: Regex,
    pub ffmpeg_settings: FfmpegSettings,
    pub use_local_processing: bool,
}

impl Config {
    /// 取得鏡頭顯示名稱，未設定時回傳代碼本身
    #[must_use]
    pub fn camera_name<'a>(&'a self, id: &'a CameraId) -> &'a str {
        self.camera_names
            .get(id)
            .map(String::as_str)
            .unwrap_or_else(|| id.as_str())
    }
}
