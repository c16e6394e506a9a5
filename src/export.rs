//! 聚合导出
//!
//! 两遍导出：第一遍扫全量记录得到科目全集和表头，第二遍逐行填充。
//! 表头依赖数据本身，只有在全部记录就绪后才能确定，所以不能边抓边写。
//! 表格构建是纯函数，写Excel只在最后一步碰磁盘。

use rust_xlsxwriter::{Color, Format, Workbook, XlsxError};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{expand_composite_subjects, Record, SubjectMark};

/// 固定的个人信息列，科目列排在这些列之后
const FIXED_HEADERS: [&str; 7] = [
    "Roll No",
    "Name",
    "Mother's Name",
    "Father's/Husband's Name",
    "Category",
    "Paper Type",
    "Timestamp",
];
/// 及格线（百分比），达到即通过
const PASS_THRESHOLD: f64 = 60.0;
/// 百分比无法计算时的占位符
const PERCENTAGE_NA: &str = "N/A";
/// 工作表名
const SHEET_NAME: &str = "CTET Results";

/// 准考证号单元格的通过标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMarker {
    Pass,
    Fail,
}

/// 一行导出数据
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub cells: Vec<String>,
    /// 百分比为 N/A 时无标记
    pub marker: Option<PassMarker>,
}

/// 完整的导出表
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<ExportRow>,
}

/// 从记录集合构建导出表
///
/// 记录按准考证号升序排（解析失败按 0 处理，稳定排序），
/// 科目全集按字母序排，同一份输入构建多次结果完全一致。
pub fn build_table(records: &[Record]) -> ExportTable {
    let records = normalize_records(records);
    let subjects = collect_subjects(&records);
    let headers = build_headers(&subjects);
    let rows = records
        .iter()
        .map(|record| build_row(record, &subjects))
        .collect();
    ExportTable { headers, rows }
}

/// 把导出表写成带条件着色的Excel工作簿
///
/// 写失败是致命错误：丢掉产物等于浪费整轮抓取。
pub fn write_xlsx(path: impl AsRef<Path>, table: &ExportTable) -> AppResult<()> {
    let path = path.as_ref();
    let mut workbook = Workbook::new();
    let pass_format = Format::new().set_background_color(Color::RGB(0x00FF00));
    let fail_format = Format::new().set_background_color(Color::RGB(0xFF0000));

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| export_err(path, e))?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header.as_str())
            .map_err(|e| export_err(path, e))?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.cells.iter().enumerate() {
            worksheet
                .write_string(row_num, col as u16, cell.as_str())
                .map_err(|e| export_err(path, e))?;
        }
        // 按百分比给准考证号单元格着色
        if let Some(marker) = row.marker {
            let format = match marker {
                PassMarker::Pass => &pass_format,
                PassMarker::Fail => &fail_format,
            };
            worksheet
                .write_string_with_format(row_num, 0, row.cells[0].as_str(), format)
                .map_err(|e| export_err(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| export_err(path, e))?;
    info!(
        "📊 已导出 {} 行到 {}",
        table.rows.len(),
        path.display()
    );
    Ok(())
}

fn export_err(path: &Path, e: XlsxError) -> AppError {
    AppError::export_failed(path.display().to_string(), e)
}

/// 防御性拆分复合科目并按准考证号排序
///
/// 自己落盘的JSON在提取阶段已拆分，这里兜住外部来源的数据；
/// 拆不开时告警并保留原条目。
fn normalize_records(records: &[Record]) -> Vec<Record> {
    let mut normalized: Vec<Record> = records
        .iter()
        .map(|record| {
            let mut record = record.clone();
            match expand_composite_subjects(&record.marks_info.subjects) {
                Ok(subjects) => record.marks_info.subjects = subjects,
                Err(reason) => warn!("⚠️ 导出时拆分复合科目失败，保留原值: {}", reason),
            }
            record
        })
        .collect();
    normalized.sort_by_key(|record| record.roll_no_value().unwrap_or(0));
    normalized
}

/// 全量记录的科目名并集，字母序
fn collect_subjects(records: &[Record]) -> Vec<String> {
    let mut subjects = BTreeSet::new();
    for record in records {
        for mark in &record.marks_info.subjects {
            subjects.insert(mark.subject.clone());
        }
    }
    subjects.into_iter().collect()
}

fn build_headers(subjects: &[String]) -> Vec<String> {
    let mut headers: Vec<String> = FIXED_HEADERS.iter().map(|h| h.to_string()).collect();
    for subject in subjects {
        headers.push(format!("{} Marks Obtained", subject));
        headers.push(format!("{} Total Marks", subject));
    }
    headers.push("Total Percentage".to_string());
    headers
}

fn build_row(record: &Record, subjects: &[String]) -> ExportRow {
    let personal = |key: &str| {
        record
            .personal_info
            .get(key)
            .cloned()
            .unwrap_or_default()
    };

    let mut cells = vec![
        personal("Roll No"),
        personal("Name"),
        personal("Mother's Name"),
        personal("Father's/Husband's Name"),
        personal("Category"),
        record.marks_info.paper_type.clone(),
        record.timestamp.clone(),
    ];

    // 缺考科目留空，空白和零分是两回事
    for subject in subjects {
        match find_subject_marks(record, subject) {
            Some((obtained, total)) => {
                cells.push(obtained);
                cells.push(total);
            }
            None => {
                cells.push(String::new());
                cells.push(String::new());
            }
        }
    }

    let percentage = compute_percentage(&record.marks_info.subjects);
    let marker = match percentage {
        Some(p) if p >= PASS_THRESHOLD => Some(PassMarker::Pass),
        Some(_) => Some(PassMarker::Fail),
        None => None,
    };
    cells.push(match percentage {
        Some(p) => format!("{:.2}%", p),
        None => PERCENTAGE_NA.to_string(),
    });

    ExportRow { cells, marker }
}

fn find_subject_marks(record: &Record, subject: &str) -> Option<(String, String)> {
    record
        .marks_info
        .subjects
        .iter()
        .find(|mark| mark.subject == subject)
        .and_then(SubjectMark::split_marks)
}

/// 对全部非 Total 科目求和算总百分比，满分合计为零时返回 None
///
/// 解析不了的成绩不计入求和，原文仍然留在各自的单元格里。
fn compute_percentage(subjects: &[SubjectMark]) -> Option<f64> {
    let mut obtained_sum = 0.0;
    let mut total_sum = 0.0;
    for mark in subjects {
        if mark.subject.to_lowercase() == "total" {
            continue;
        }
        let Some((obtained, total)) = mark.split_marks() else {
            continue;
        };
        let (Ok(obtained), Ok(total)) = (obtained.parse::<f64>(), total.parse::<f64>()) else {
            continue;
        };
        obtained_sum += obtained;
        total_sum += total;
    }
    if total_sum > 0.0 {
        Some(obtained_sum / total_sum * 100.0)
    } else {
        None
    }
}
