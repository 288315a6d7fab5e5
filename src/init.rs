use env_logger::Env;

/// 初始化日誌系統，預設只顯示警告以上等級（RUST_LOG 可覆寫）
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .init();
}
