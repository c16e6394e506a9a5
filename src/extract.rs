//! 结果页面解析
//!
//! 从已加载的成绩页面提取个人信息和各科成绩。表格按结构特征定位
//! （宽度属性、表头文本），不依赖固定的行列位置，能容忍页面的小改动。
//! 解析失败返回分类结果而不是直接报错，由调用方决定重试还是跳过。

use std::collections::BTreeMap;

use crate::driver::{PageDriver, PageElement};
use crate::error::DriverError;
use crate::models::{expand_composite_subjects, MarksInfo, Record, SubjectMark};

/// 个人信息表的结构定位
const PERSONAL_TABLE_SELECTOR: &str = "table[width='50%']";
/// 成绩表的结构定位
const MARKS_TABLE_SELECTOR: &str = "table[width='75%']";
/// 成绩表的表头识别文本
const MARKS_TABLE_HEADER: &str = "SUBJECT NAME";

/// 解析失败分类
#[derive(Debug)]
pub enum ExtractError {
    /// 页面结构不完整或关键字段缺失
    Malformed(String),
    /// 驱动层错误，调用方按瞬态失败处理
    Driver(DriverError),
}

impl From<DriverError> for ExtractError {
    fn from(err: DriverError) -> Self {
        ExtractError::Driver(err)
    }
}

/// 从当前页面提取一条成绩记录
///
/// 个人信息非空且至少有一条科目成绩才算成功。
pub async fn extract_record(driver: &dyn PageDriver) -> Result<Record, ExtractError> {
    let personal_info = extract_personal_info(driver).await?;
    if personal_info.is_empty() {
        return Err(ExtractError::Malformed("个人信息表为空或缺失".to_string()));
    }

    let Some(marks_info) = extract_marks_info(driver).await? else {
        return Err(ExtractError::Malformed("未找到成绩表".to_string()));
    };
    if marks_info.subjects.is_empty() {
        return Err(ExtractError::Malformed(
            "成绩表中没有有效的科目行".to_string(),
        ));
    }

    Ok(Record::new(personal_info, marks_info))
}

/// 提取个人信息表的键值对，外加表格之外的 Category 标签
async fn extract_personal_info(
    driver: &dyn PageDriver,
) -> Result<BTreeMap<String, String>, ExtractError> {
    let mut personal = BTreeMap::new();

    if let Some(table) = driver
        .find_all(PERSONAL_TABLE_SELECTOR)
        .await?
        .into_iter()
        .next()
    {
        for row in table.find_all("tr").await? {
            let cells = row.find_all("td").await?;
            if cells.len() != 2 {
                continue;
            }
            let key = cells[0].text().await?;
            let key = key.trim().trim_end_matches(':').trim();
            let value = cells[1].text().await?;
            let value = value.trim();
            // 键或值为空的行直接跳过，不算错误
            if !key.is_empty() && !value.is_empty() {
                personal.insert(key.to_string(), value.to_string());
            }
        }
    }

    // Category 标签在表格之外，尽力提取，找不到就省略
    if let Some(category) = extract_category(driver).await? {
        personal.insert("Category".to_string(), category);
    }

    Ok(personal)
}

/// 在 font 元素里找 Category 标签，取冒号之后的部分
async fn extract_category(driver: &dyn PageDriver) -> Result<Option<String>, ExtractError> {
    for element in driver.find_all("font").await? {
        let text = element.text().await?;
        if !text.contains("Category") {
            continue;
        }
        if let Some((_, value)) = text.split_once(':') {
            let value = value.trim();
            if !value.is_empty() {
                return Ok(Some(value.to_string()));
            }
        }
    }
    Ok(None)
}

/// 定位并解析成绩表，没有匹配的表时返回 None
async fn extract_marks_info(driver: &dyn PageDriver) -> Result<Option<MarksInfo>, ExtractError> {
    for table in driver.find_all(MARKS_TABLE_SELECTOR).await? {
        if !table.text().await?.contains(MARKS_TABLE_HEADER) {
            continue;
        }

        let rows = table.find_all("tr").await?;
        let paper_type = match rows.first() {
            Some(row) => row.text().await?.trim().to_string(),
            None => String::new(),
        };

        let mut subjects = Vec::new();
        // 前两行是表头，数据行从第三行开始
        for row in rows.iter().skip(2) {
            let cells = row.find_all("td").await?;
            if cells.len() != 2 {
                continue;
            }
            let subject = cells[0].text().await?;
            let subject = subject.trim();
            let marks = cells[1].text().await?;
            let marks = marks.trim();
            if subject.is_empty() || marks.is_empty() {
                continue;
            }
            if !marks.to_lowercase().contains("out of") {
                continue;
            }
            subjects.push(SubjectMark::new(subject, marks));
        }

        // 复合科目在提取阶段就拆开，模式不匹配时整条记录算残缺
        let subjects = expand_composite_subjects(&subjects).map_err(ExtractError::Malformed)?;

        return Ok(Some(MarksInfo {
            paper_type,
            subjects,
        }));
    }
    Ok(None)
}
