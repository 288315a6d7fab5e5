//! 檔名解析模組
//!
//! 依設定的樣式從行車記錄器檔名取出日期、時刻、連號與鏡頭代碼

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

/// 解析成功的檔名欄位
///
/// 數值欄位用來排序與過濾，原始字串欄位保留檔名中的原樣寫法
/// （含補零），顯示與重組檔名時不會失真。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVideoName {
    /// 錄影日期
    pub date: NaiveDate,
    /// 錄影開始時刻
    pub time: NaiveTime,
    /// 檔案連號，同一秒內開始的片段靠它區分先後
    pub sequence: u32,
    /// 鏡頭代碼（例如 F 或 B）
    pub camera: String,
    /// 檔名中的日期原始字串
    pub date_str: String,
    /// 檔名中的時刻原始字串
    pub time_str: String,
    /// 檔名中的連號原始字串
    pub sequence_str: String,
}

impl ParsedVideoName {
    /// 格式化成 HH:MM:SS
    #[must_use]
    pub fn formatted_time(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

/// 檔名解析器
///
/// 樣式來自設定檔，必須依序擷取日期（YYYYMMDD）、時刻（HHMMSS）、
/// 連號與鏡頭代碼四個群組。
pub struct FilenameParser {
    pattern: Regex,
}

impl FilenameParser {
    #[must_use]
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// 解析單一檔名
    ///
    /// # Arguments
    /// * `filename` - 不含路徑的檔名
    ///
    /// # Returns
    /// 解析成功時回傳所有欄位；樣式不符、日期或時刻不存在、
    /// 連號超出範圍時回傳 `None`。不符合的檔名不是錯誤，
    /// 呼叫端應直接略過。
    #[must_use]
    pub fn parse(&self, filename: &str) -> Option<ParsedVideoName> {
        let caps = self.pattern.captures(filename)?;
        let date_str = caps.get(1)?.as_str();
        let time_str = caps.get(2)?.as_str();
        let sequence_str = caps.get(3)?.as_str();
        let camera = caps.get(4)?.as_str();

        let date = NaiveDate::parse_from_str(date_str, "%Y%m%d").ok()?;
        let time = NaiveTime::parse_from_str(time_str, "%H%M%S").ok()?;
        let sequence = sequence_str.parse::<u32>().ok()?;

        Some(ParsedVideoName {
            date,
            time,
            sequence,
            camera: camera.to_string(),
            date_str: date_str.to_string(),
            time_str: time_str.to_string(),
            sequence_str: sequence_str.to_string(),
        })
    }
}
