pub mod load;
pub mod types;

pub use types::{
    CameraId, Config, ConfigFile, CopyCodecSettings, FfmpegSettings, PerformanceSettings,
    ReencodeSettings,
};
