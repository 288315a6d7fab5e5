use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// 確保資料夾存在，不存在時遞迴建立
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("無法建立資料夾: {}", path.display()))?;
    }
    Ok(())
}
