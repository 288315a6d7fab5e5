//! 影片掃描與分組模組
//!
//! 逐一掃描各鏡頭資料夾的第一層檔案，依（日期、鏡頭）分組並排序

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use log::{debug, warn};
use walkdir::WalkDir;

use crate::component::video_merger::file_parser::{FilenameParser, ParsedVideoName};
use crate::config::{CameraId, Config};

/// 掃描到的單一影片檔
#[derive(Debug, Clone)]
pub struct VideoFile {
    /// 絕對路徑
    pub path: PathBuf,
    pub size: u64,
    pub name: ParsedVideoName,
}

/// 同一天同一鏡頭的影片集合，檔案已排序且保證非空
#[derive(Debug, Clone)]
pub struct VideoGroup {
    pub date: NaiveDate,
    pub camera: CameraId,
    pub files: Vec<VideoFile>,
}

impl VideoGroup {
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }
}

/// 掃描所有鏡頭資料夾並分組
///
/// # Arguments
/// * `config` - 執行設定
/// * `target_date` - 有指定時只收集該日期的檔案
///
/// # Returns
/// 依（日期、鏡頭）排序的群組清單，沒有符合的檔案時為空
#[must_use]
pub fn scan_video_groups(config: &Config, target_date: Option<NaiveDate>) -> Vec<VideoGroup> {
    let parser = FilenameParser::new(config.video_pattern.clone());
    let mut partitions: BTreeMap<(NaiveDate, CameraId), Vec<VideoFile>> = BTreeMap::new();

    for (camera, directory) in &config.camera_paths {
        if !directory.is_dir() {
            warn!(
                "鏡頭 {camera} 的資料夾不存在，視為沒有檔案: {}",
                directory.display()
            );
            continue;
        }

        for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("讀取目錄項目失敗: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                debug!("略過非 UTF-8 檔名: {}", entry.path().display());
                continue;
            };
            let Some(parsed) = parser.parse(file_name) else {
                debug!("略過不符合樣式的檔案: {file_name}");
                continue;
            };
            // 檔名中的鏡頭代碼必須與資料夾設定一致
            if parsed.camera != camera.as_str() {
                debug!("略過鏡頭代碼不符的檔案: {file_name}");
                continue;
            }
            if target_date.is_some_and(|date| date != parsed.date) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("無法讀取檔案資訊 {file_name}: {e}");
                    continue;
                }
            };
            // 合併清單需要絕對路徑
            let path = match entry.path().canonicalize() {
                Ok(path) => path,
                Err(e) => {
                    warn!("無法取得絕對路徑 {file_name}: {e}");
                    continue;
                }
            };

            partitions
                .entry((parsed.date, camera.clone()))
                .or_default()
                .push(VideoFile {
                    path,
                    size,
                    name: parsed,
                });
        }
    }

    partitions
        .into_iter()
        .map(|((date, camera), mut files)| {
            sort_group_files(&mut files);
            VideoGroup {
                date,
                camera,
                files,
            }
        })
        .collect()
}

/// 依（時刻、連號）排序，兩者皆相同時用路徑字典序保證順序固定
fn sort_group_files(files: &mut [VideoFile]) {
    files.sort_by(|a, b| {
        a.name
            .time
            .cmp(&b.name.time)
            .then_with(|| a.name.sequence.cmp(&b.name.sequence))
            .then_with(|| a.path.cmp(&b.path))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CopyCodecSettings, FfmpegSettings, ReencodeSettings};
    use chrono::NaiveTime;
    use regex::Regex;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const TEST_PATTERN: &str = r"^NO(\d{8})-(\d{6})-(\d{6})([FB])\.MP4$";

    fn test_ffmpeg_settings() -> FfmpegSettings {
        FfmpegSettings {
            copy_codec: CopyCodecSettings {
                video: "copy".to_string(),
                audio: "copy".to_string(),
            },
            reencode_settings: ReencodeSettings {
                video_codec: "libx264".to_string(),
                audio_codec: "aac".to_string(),
                preset: "medium".to_string(),
                crf: "23".to_string(),
            },
        }
    }

    fn test_config(front: &Path, back: &Path, output: &Path) -> Config {
        let mut camera_paths = BTreeMap::new();
        camera_paths.insert(CameraId::new("F").unwrap(), front.to_path_buf());
        camera_paths.insert(CameraId::new("B").unwrap(), back.to_path_buf());

        let mut camera_names = BTreeMap::new();
        camera_names.insert(CameraId::new("F").unwrap(), "前鏡頭".to_string());
        camera_names.insert(CameraId::new("B").unwrap(), "後鏡頭".to_string());

        Config {
            camera_paths,
            camera_names,
            output_dir: output.to_path_buf(),
            video_pattern: Regex::new(TEST_PATTERN).unwrap(),
            ffmpeg_settings: test_ffmpeg_settings(),
            use_local_processing: false,
        }
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"video data").unwrap();
    }

    fn make_video_file(path: &str, time: NaiveTime, sequence: u32) -> VideoFile {
        VideoFile {
            path: PathBuf::from(path),
            size: 0,
            name: ParsedVideoName {
                date: NaiveDate::from_ymd_opt(2025, 9, 6).unwrap(),
                time,
                sequence,
                camera: "F".to_string(),
                date_str: "20250906".to_string(),
                time_str: time.format("%H%M%S").to_string(),
                sequence_str: format!("{sequence:06}"),
            },
        }
    }

    #[test]
    fn test_scan_groups_by_date_and_camera() {
        let temp_dir = TempDir::new().unwrap();
        let front = temp_dir.path().join("front");
        let back = temp_dir.path().join("back");
        fs::create_dir_all(&front).unwrap();
        fs::create_dir_all(&back).unwrap();

        touch(&front, "NO20250906-134056-000895F.MP4");
        touch(&front, "NO20250906-134156-000896F.MP4");
        touch(&front, "NO20250907-090000-000001F.MP4");
        touch(&back, "NO20250906-134056-000895B.MP4");

        let config = test_config(&front, &back, temp_dir.path());
        let groups = scan_video_groups(&config, None);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2025, 9, 6).unwrap());
        assert_eq!(groups[0].camera.as_str(), "B");
        assert_eq!(groups[1].date, NaiveDate::from_ymd_opt(2025, 9, 6).unwrap());
        assert_eq!(groups[1].camera.as_str(), "F");
        assert_eq!(groups[1].files.len(), 2);
        assert_eq!(groups[2].date, NaiveDate::from_ymd_opt(2025, 9, 7).unwrap());
        assert_eq!(groups[2].camera.as_str(), "F");
    }

    #[test]
    fn test_scan_orders_files_by_time_then_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let front = temp_dir.path().join("front");
        let back = temp_dir.path().join("back");
        fs::create_dir_all(&front).unwrap();
        fs::create_dir_all(&back).unwrap();

        // 故意用亂序建立，排序不能依賴檔案系統順序
        touch(&front, "NO20250906-134156-000897F.MP4");
        touch(&front, "NO20250906-134056-000896F.MP4");
        touch(&front, "NO20250906-134056-000895F.MP4");

        let config = test_config(&front, &back, temp_dir.path());
        let groups = scan_video_groups(&config, None);

        assert_eq!(groups.len(), 1);
        let sequences: Vec<u32> = groups[0]
            .files
            .iter()
            .map(|file| file.name.sequence)
            .collect();
        assert_eq!(sequences, vec![895, 896, 897], "同一時刻應該依連號排序");
    }

    #[test]
    fn test_sort_breaks_ties_by_path() {
        let time = NaiveTime::from_hms_opt(13, 40, 56).unwrap();
        let mut files = vec![
            make_video_file("/videos/front/b.MP4", time, 895),
            make_video_file("/videos/front/a.MP4", time, 895),
        ];

        sort_group_files(&mut files);

        assert_eq!(files[0].path, PathBuf::from("/videos/front/a.MP4"));
        assert_eq!(files[1].path, PathBuf::from("/videos/front/b.MP4"));
    }

    #[test]
    fn test_scan_excludes_non_matching_and_wrong_camera() {
        let temp_dir = TempDir::new().unwrap();
        let front = temp_dir.path().join("front");
        let back = temp_dir.path().join("back");
        fs::create_dir_all(&front).unwrap();
        fs::create_dir_all(&back).unwrap();

        touch(&front, "NO20250906-134056-000895F.MP4");
        touch(&front, "holiday_video.mp4");
        touch(&front, "merged_2025-09-06_F.mp4");
        // 後鏡頭的檔案誤放進前鏡頭資料夾，不應該被收進任何群組
        touch(&front, "NO20250906-134056-000895B.MP4");

        let config = test_config(&front, &back, temp_dir.path());
        let groups = scan_video_groups(&config, None);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].camera.as_str(), "F");
        assert_eq!(groups[0].files.len(), 1);
    }

    #[test]
    fn test_scan_skips_missing_camera_directory() {
        let temp_dir = TempDir::new().unwrap();
        let front = temp_dir.path().join("front");
        fs::create_dir_all(&front).unwrap();
        let back = temp_dir.path().join("does_not_exist");

        touch(&front, "NO20250906-134056-000895F.MP4");

        let config = test_config(&front, &back, temp_dir.path());
        let groups = scan_video_groups(&config, None);

        assert_eq!(groups.len(), 1, "缺少的鏡頭資料夾不應該中斷掃描");
        assert_eq!(groups[0].camera.as_str(), "F");
    }

    #[test]
    fn test_scan_filters_by_target_date() {
        let temp_dir = TempDir::new().unwrap();
        let front = temp_dir.path().join("front");
        let back = temp_dir.path().join("back");
        fs::create_dir_all(&front).unwrap();
        fs::create_dir_all(&back).unwrap();

        touch(&front, "NO20250905-100000-000001F.MP4");
        touch(&front, "NO20250906-134056-000895F.MP4");

        let config = test_config(&front, &back, temp_dir.path());
        let target = NaiveDate::from_ymd_opt(2025, 9, 6).unwrap();
        let groups = scan_video_groups(&config, Some(target));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].date, target);
        assert_eq!(groups[0].files.len(), 1);
    }

    #[test]
    fn test_scan_ignores_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let front = temp_dir.path().join("front");
        let back = temp_dir.path().join("back");
        let nested = front.join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(&back).unwrap();

        touch(&front, "NO20250906-134056-000895F.MP4");
        touch(&nested, "NO20250906-134156-000896F.MP4");

        let config = test_config(&front, &back, temp_dir.path());
        let groups = scan_video_groups(&config, None);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 1, "子資料夾的檔案不應該被收進群組");
    }

    #[test]
    fn test_group_total_size() {
        let temp_dir = TempDir::new().unwrap();
        let front = temp_dir.path().join("front");
        let back = temp_dir.path().join("back");
        fs::create_dir_all(&front).unwrap();
        fs::create_dir_all(&back).unwrap();

        fs::write(front.join("NO20250906-134056-000895F.MP4"), vec![0u8; 100]).unwrap();
        fs::write(front.join("NO20250906-134156-000896F.MP4"), vec![0u8; 150]).unwrap();

        let config = test_config(&front, &back, temp_dir.path());
        let groups = scan_video_groups(&config, None);

        assert_eq!(groups[0].total_size(), 250);
    }
}
