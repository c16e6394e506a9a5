//! # CTET Result Scraper
//!
//! 按准考证号批量抓取CTET成绩并导出Excel的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构，下层只暴露能力，不认识上层的业务：
//!
//! ### ① 驱动层（Driver）
//! - `driver` - 页面驱动能力 trait（导航/等待/查找/输入）
//! - `browser` - chromiumoxide 生产实现，一个工作线程独占一个会话
//!
//! ### ② 解析层（Extract）
//! - `extract` - 从结果页面提取记录，失败分为残缺和瞬态两类
//! - `models` - 记录、科目成绩的数据模型与复合科目拆分
//!
//! ### ③ 抓取层（Fetch）
//! - `fetch` - 单个准考证号的状态机：加载 → 提交 → 等待 → 分类，带重试上限
//!
//! ### ④ 调度层（Scheduler）
//! - `scheduler` - 区间分片、工作线程池、共享聚合、中断处理
//! - `aggregate` - 去重和校验后的记录集合
//!
//! ### ⑤ 导出层（Export）
//! - `storage` - 记录的JSON落盘与读取（两阶段之间的交换格式）
//! - `export` - 两遍构建导出表并写带条件着色的Excel
//!
//! ### ⑥ 编排层（App）
//! - `app` - 启动、中断、统计与各阶段的串联

pub mod aggregate;
pub mod app;
pub mod browser;
pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod logger;
pub mod models;
pub mod scheduler;
pub mod storage;

// 重新导出常用类型
pub use aggregate::Aggregate;
pub use app::App;
pub use browser::{ChromeSession, ChromeSessionFactory};
pub use config::Config;
pub use driver::{PageDriver, PageElement, SessionFactory};
pub use error::{AppError, AppResult, DriverError, DriverResult};
pub use export::{build_table, write_xlsx, ExportRow, ExportTable, PassMarker};
pub use fetch::{fetch_with_retry, FetchOutcome, FetchReport};
pub use models::{MarksInfo, Record, SubjectMark};
pub use scheduler::{partition_rolls, run_pool, RollSlice, RunStats};
