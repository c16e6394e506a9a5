//! 测试用的模拟页面驱动
//!
//! 用脚本步骤控制每次查询看到的页面：输入框不出现、无效号码提示、
//! 完整结果页或缺成绩表的残缺页。结果页的 Roll No 取自填入的号码，
//! 可以驱动完整的抓取和调度流程而不碰真实浏览器。

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ctet_result_scraper::config::Config;
use ctet_result_scraper::driver::{PageDriver, PageElement, SessionFactory};
use ctet_result_scraper::error::{DriverError, DriverResult};
use ctet_result_scraper::models::{MarksInfo, Record, SubjectMark};

/// 每次 navigate 消耗一个脚本步骤，耗尽后重复最后一个
#[derive(Debug, Clone)]
pub enum Script {
    /// 查询输入框一直不出现
    Timeout,
    /// 页面提示号码无效
    Invalid,
    /// 返回结构完整的结果页
    Valid,
    /// 返回缺少成绩表的残缺页面
    Malformed,
}

pub struct FakeDriver {
    scripts: Mutex<VecDeque<Script>>,
    current: Mutex<Script>,
    typed: Arc<Mutex<String>>,
}

impl FakeDriver {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            current: Mutex::new(Script::Timeout),
            typed: Arc::new(Mutex::new(String::new())),
        }
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&self, _url: &str) -> DriverResult<()> {
        let mut scripts = self.scripts.lock().unwrap();
        let step = if scripts.len() > 1 {
            scripts.pop_front().unwrap()
        } else {
            scripts.front().cloned().unwrap_or(Script::Timeout)
        };
        *self.current.lock().unwrap() = step;
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> DriverResult<Box<dyn PageElement>> {
        let current = self.current.lock().unwrap().clone();
        match current {
            Script::Timeout => Err(DriverError::ElementTimeout {
                selector: selector.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
            _ => {
                if selector == "input[name='regno']" {
                    Ok(Box::new(FakeInput {
                        typed: self.typed.clone(),
                    }))
                } else {
                    Ok(Box::new(FakeNode::default()))
                }
            }
        }
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>> {
        let current = self.current.lock().unwrap().clone();
        let document = match current {
            Script::Timeout => FakeNode::default(),
            Script::Invalid => invalid_document(),
            Script::Valid => result_document(&self.typed.lock().unwrap()),
            Script::Malformed => malformed_document(),
        };
        Ok(document.children_of(selector))
    }

    async fn close(self: Box<Self>) -> DriverResult<()> {
        Ok(())
    }
}

/// 会话工厂：每个会话都拿到同一份脚本
pub struct FakeFactory {
    pub scripts: Vec<Script>,
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open_session(&self) -> DriverResult<Box<dyn PageDriver>> {
        Ok(Box::new(FakeDriver::new(self.scripts.clone())))
    }
}

/// 静态页面节点，children 按选择器分组
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    text: String,
    children: HashMap<String, Vec<FakeNode>>,
}

impl FakeNode {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn add(mut self, selector: &str, node: FakeNode) -> Self {
        self.children.entry(selector.to_string()).or_default().push(node);
        self
    }

    fn children_of(&self, selector: &str) -> Vec<Box<dyn PageElement>> {
        self.children
            .get(selector)
            .map(|nodes| {
                nodes
                    .iter()
                    .cloned()
                    .map(|node| Box::new(node) as Box<dyn PageElement>)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageElement for FakeNode {
    async fn text(&self) -> DriverResult<String> {
        Ok(self.text.clone())
    }

    async fn click(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn send_keys(&self, _text: &str) -> DriverResult<()> {
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>> {
        Ok(self.children_of(selector))
    }
}

/// 查询输入框：记住填入的号码，结果页据此生成
pub struct FakeInput {
    typed: Arc<Mutex<String>>,
}

#[async_trait]
impl PageElement for FakeInput {
    async fn text(&self) -> DriverResult<String> {
        Ok(self.typed.lock().unwrap().clone())
    }

    async fn click(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        self.typed.lock().unwrap().push_str(text);
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        self.typed.lock().unwrap().clear();
        Ok(())
    }

    async fn find_all(&self, _selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>> {
        Ok(Vec::new())
    }
}

// ========== 页面构造 ==========

fn two_cell_row(key: &str, value: &str) -> FakeNode {
    FakeNode::default()
        .add("td", FakeNode::with_text(key))
        .add("td", FakeNode::with_text(value))
}

fn personal_table(roll: &str) -> FakeNode {
    FakeNode::default()
        .add("tr", two_cell_row("Roll No:", roll))
        .add("tr", two_cell_row("Name:", "TEST CANDIDATE"))
        .add("tr", two_cell_row("Mother's Name:", "TEST MOTHER"))
        .add("tr", two_cell_row("Father's/Husband's Name:", "TEST FATHER"))
}

fn marks_table() -> FakeNode {
    FakeNode::with_text("PAPER II SUBJECT NAME MARKS")
        .add("tr", FakeNode::with_text("PAPER II"))
        .add("tr", two_cell_row("SUBJECT NAME", "MARKS OBTAINED"))
        .add(
            "tr",
            two_cell_row("CHILD DEVELOPMENT & PEDAGOGY", "23 out of 30"),
        )
        .add(
            "tr",
            two_cell_row(
                "Mathematics & Science",
                "45 out of 60 (Mathematics - 24 Science - 21)",
            ),
        )
        .add("tr", two_cell_row("LANGUAGE - I", "24 out of 30"))
        .add("tr", two_cell_row("TOTAL", "92 out of 120"))
}

/// 结构完整的结果页
pub fn result_document(roll: &str) -> FakeNode {
    FakeNode::default()
        .add("table[width='50%']", personal_table(roll))
        .add("table[width='75%']", marks_table())
        .add("font", FakeNode::with_text("Category : GENERAL"))
}

/// 带无效号码提示的页面
pub fn invalid_document() -> FakeNode {
    FakeNode::default().add(
        "font",
        FakeNode::with_text("Invalid Roll Number ! Please try again"),
    )
}

/// 只有个人信息表、缺成绩表的残缺页面
pub fn malformed_document() -> FakeNode {
    FakeNode::default().add("table[width='50%']", personal_table("218100001"))
}

// ========== 测试辅助 ==========

/// 去掉各种等待的快速配置
pub fn fast_config() -> Config {
    Config {
        max_attempts: 3,
        wait_timeout_secs: 1,
        settle_delay_ms: 0,
        retry_delay_ms: 0,
        request_delay_ms: 0,
        ..Config::default()
    }
}

/// 构造一条指定准考证号和科目的记录
pub fn sample_record(roll: &str, subjects: Vec<SubjectMark>) -> Record {
    let mut personal = BTreeMap::new();
    personal.insert("Roll No".to_string(), roll.to_string());
    personal.insert("Name".to_string(), format!("CANDIDATE {}", roll));
    personal.insert("Mother's Name".to_string(), "TEST MOTHER".to_string());
    personal.insert(
        "Father's/Husband's Name".to_string(),
        "TEST FATHER".to_string(),
    );
    personal.insert("Category".to_string(), "GENERAL".to_string());
    Record {
        personal_info: personal,
        marks_info: MarksInfo {
            paper_type: "PAPER II".to_string(),
            subjects,
        },
        timestamp: "2025-01-31 12:00:00".to_string(),
    }
}
