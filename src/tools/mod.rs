mod ffmpeg_info;
mod path_validator;

pub use ffmpeg_info::check_ffmpeg;
pub use path_validator::ensure_directory_exists;
