//! 成绩记录数据模型
//!
//! 字段名与落盘JSON一一对应，抓取阶段和导出阶段靠这份结构交换数据。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// 复合科目单元格的科目名
pub const MATH_SCIENCE_SUBJECT: &str = "Mathematics & Science";
/// 复合科目拆分后两科各自的满分
pub const MATH_SCIENCE_TOTAL: u32 = 30;

/// 复合单元格内嵌成绩的固定文本模式
static MATH_SCIENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Mathematics\s*-\s*(\d+)\s*Science\s*-\s*(\d+)").expect("固定模式必然合法")
});

/// 单科成绩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMark {
    pub subject: String,
    /// 原始成绩文本，形如 "118 out of 150"
    pub marks: String,
}

impl SubjectMark {
    pub fn new(subject: impl Into<String>, marks: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            marks: marks.into(),
        }
    }

    /// 把成绩文本拆成（得分, 满分），拆不开时返回 None
    pub fn split_marks(&self) -> Option<(String, String)> {
        split_out_of(&self.marks)
    }
}

/// 按 "out of" 把成绩文本拆成两段，大小写不敏感
pub fn split_out_of(marks: &str) -> Option<(String, String)> {
    let lower = marks.to_lowercase();
    let idx = lower.find("out of")?;
    let obtained = marks.get(..idx)?.trim().to_string();
    let total = marks.get(idx + "out of".len()..)?.trim().to_string();
    Some((obtained, total))
}

/// 科目成绩与试卷类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarksInfo {
    /// 成绩表首行的试卷类型文本
    #[serde(default)]
    pub paper_type: String,
    pub subjects: Vec<SubjectMark>,
}

/// 一名考生的完整成绩记录
///
/// 抓取成功时创建一次，之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub personal_info: BTreeMap<String, String>,
    pub marks_info: MarksInfo,
    /// 抓取时间，格式 %Y-%m-%d %H:%M:%S
    pub timestamp: String,
}

impl Record {
    /// 以当前时间为抓取时间创建记录
    pub fn new(personal_info: BTreeMap<String, String>, marks_info: MarksInfo) -> Self {
        Self {
            personal_info,
            marks_info,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// 个人信息表中的准考证号原文
    pub fn roll_no(&self) -> Option<&str> {
        self.personal_info.get("Roll No").map(String::as_str)
    }

    /// 解析为正整数的准考证号
    pub fn roll_no_value(&self) -> Option<u64> {
        self.roll_no()?
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
    }
}

/// 把 "Mathematics & Science" 复合单元格拆成两条独立成绩
///
/// 复合单元格的文本固定形如 "45 out of 60 (Mathematics - 24 Science - 21)"，
/// 拆出的 Mathematics、Science 两科满分固定为 30，不从原文本反推。
/// 模式不匹配时整条记录视为残缺，由调用方决定重试或放弃。
pub fn expand_composite_subjects(subjects: &[SubjectMark]) -> Result<Vec<SubjectMark>, String> {
    let mut expanded = Vec::with_capacity(subjects.len());
    for mark in subjects {
        if mark.subject == MATH_SCIENCE_SUBJECT {
            let caps = MATH_SCIENCE_RE
                .captures(&mark.marks)
                .ok_or_else(|| format!("无法解析复合科目成绩: {}", mark.marks))?;
            expanded.push(SubjectMark::new(
                "Mathematics",
                format!("{} out of {}", &caps[1], MATH_SCIENCE_TOTAL),
            ));
            expanded.push(SubjectMark::new(
                "Science",
                format!("{} out of {}", &caps[2], MATH_SCIENCE_TOTAL),
            ));
        } else {
            expanded.push(mark.clone());
        }
    }
    Ok(expanded)
}
