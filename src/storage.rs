//! 抓取结果的JSON落盘与读取
//!
//! 抓取阶段和导出阶段之间靠这份JSON交换数据，写出和读回必须无损。

use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::Record;

/// 把全部记录写成带缩进的JSON数组
pub fn save_records(path: impl AsRef<Path>, records: &[Record]) -> AppResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
    info!("💾 已保存 {} 条记录到 {}", records.len(), path.display());
    Ok(())
}

/// 从JSON数组读取全部记录
pub fn load_records(path: impl AsRef<Path>) -> AppResult<Vec<Record>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    let records: Vec<Record> = serde_json::from_str(&content)
        .map_err(|e| AppError::json_parse_failed(path.display().to_string(), e))?;
    info!("📂 从 {} 读取到 {} 条记录", path.display(), records.len());
    Ok(records)
}
