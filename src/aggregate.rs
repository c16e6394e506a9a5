//! 运行期共享的成绩聚合

use std::collections::HashSet;
use tracing::warn;

use crate::models::Record;

/// 全部成功抓取的记录集合
///
/// 不变量：每个准考证号至多一条记录，键以页面上的 Roll No 字段为准，
/// 而不是查询时使用的号码。
#[derive(Debug, Default)]
pub struct Aggregate {
    records: Vec<Record>,
    seen: HashSet<u64>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一条记录，插入成功返回 true
    ///
    /// 准考证号缺失、非正整数或重复的记录会被拒绝并记录警告；
    /// 页面号码与查询号码不一致时只告警，记录本身保留。
    pub fn insert(&mut self, requested_roll: u64, record: Record) -> bool {
        let Some(roll) = record.roll_no_value() else {
            warn!(
                "⚠️ 准考证号 {} 的记录缺少可解析的 Roll No 字段，已丢弃",
                requested_roll
            );
            return false;
        };
        if roll != requested_roll {
            warn!(
                "⚠️ 页面准考证号 {} 与查询号码 {} 不一致",
                roll, requested_roll
            );
        }
        if !self.seen.insert(roll) {
            warn!("⚠️ 准考证号 {} 已有记录，忽略重复结果", roll);
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
