use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::config::types::{CameraId, Config, ConfigFile};
use crate::tools::ensure_directory_exists;

/// 檔名樣式必須擷取的欄位數（日期、時刻、連號、鏡頭）
const PATTERN_CAPTURE_GROUPS: usize = 4;

impl Config {
    /// 讀取並驗證設定檔
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("無法讀取設定檔: {}", path.display()))?;
        let raw: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("無法解析設定檔: {}", path.display()))?;
        Self::from_file(raw)
    }

    /// 驗證原始設定並轉成執行設定
    pub fn from_file(raw: ConfigFile) -> Result<Self> {
        if raw.camera_paths.is_empty() {
            bail!("camera_paths 不能為空，至少需要一個鏡頭");
        }

        let mut camera_paths = BTreeMap::new();
        for (id, path) in raw.camera_paths {
            camera_paths.insert(CameraId::new(&id)?, path);
        }

        let mut camera_names = BTreeMap::new();
        for (id, name) in raw.camera_names {
            camera_names.insert(CameraId::new(&id)?, name);
        }

        let video_pattern = Regex::new(&raw.video_pattern)
            .with_context(|| format!("video_pattern 不是有效的正規表達式: {}", raw.video_pattern))?;
        // captures_len 包含整體比對群組，所以要加一
        if video_pattern.captures_len() != PATTERN_CAPTURE_GROUPS + 1 {
            bail!(
                "video_pattern 必須有 {PATTERN_CAPTURE_GROUPS} 個擷取群組（日期、時刻、連號、鏡頭）: {}",
                raw.video_pattern
            );
        }

        Ok(Self {
            camera_paths,
            camera_names,
            output_dir: raw.output_dir,
            video_pattern,
            ffmpeg_settings: raw.ffmpeg_settings,
            use_local_processing: raw.performance_settings.use_local_processing,
        })
    }

    /// 確保輸出資料夾存在，不存在時建立
    pub fn ensure_output_dir(&self) -> Result<()> {
        ensure_directory_exists(&self.output_dir)
    }
}
