use chrono::{Local, TimeZone, Utc};

/// 当前时间，Unix 毫秒
pub fn current_timestamp() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// 按本地时区格式化为 dd-mm-yyyy HH:MM:SS
pub fn format_timestamp(millis: u64) -> String {
    match Local.timestamp_millis_opt(millis as i64).single() {
        Some(time) => time.format("%d-%m-%Y %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}
