//! 行車記錄器影片合併元件
//!
//! 掃描各鏡頭資料夾，依日期與鏡頭分組後用 ffmpeg 合併為單一影片

mod ffmpeg_command;
mod file_parser;
mod main;
mod merge_executor;
mod video_scanner;

pub use ffmpeg_command::{ConcatCommand, MergeStrategy};
pub use file_parser::{FilenameParser, ParsedVideoName};
pub use main::{MergeReport, VideoMerger};
pub use merge_executor::{FailureKind, MergeExecutor, MergeFailure, MergeResult, MergeState};
pub use video_scanner::{VideoFile, VideoGroup, scan_video_groups};
