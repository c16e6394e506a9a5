//! 应用编排
//!
//! ## 职责
//!
//! 1. **启动**：打印启动横幅、挂接 Ctrl-C 中断
//! 2. **抓取**：把会话工厂和配置交给调度器跑完整个区间
//! 3. **落盘**：抓取结果先写JSON，中断时写已收集的部分
//! 4. **导出**：从记录构建导出表并写Excel
//! 5. **统计**：始终打印收集数与请求数的对比
//!
//! 个别准考证号的失败不影响退出码；只有落盘和导出失败才让进程以非零退出。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::browser::ChromeSessionFactory;
use crate::config::Config;
use crate::driver::SessionFactory;
use crate::error::AppResult;
use crate::models::Record;
use crate::scheduler::{self, RunStats};
use crate::{export, storage};

/// 应用主结构
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// 初始化应用
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// 运行应用主逻辑：抓取 → 落盘 → 导出
    pub async fn run(&self) -> AppResult<()> {
        log_startup(&self.config);

        let records = if self.config.export_only {
            info!("📂 仅导出模式，跳过抓取");
            storage::load_records(&self.config.output_json)?
        } else {
            self.collect().await?
        };

        if records.is_empty() {
            warn!("⚠️ 没有可导出的记录，仍会生成空表");
        }

        let table = export::build_table(&records);
        export::write_xlsx(&self.config.output_xlsx, &table)?;

        Ok(())
    }

    /// 跑完整个准考证号区间并把结果落盘
    async fn collect(&self) -> AppResult<Vec<Record>> {
        let shutdown = Arc::new(AtomicBool::new(false));
        spawn_interrupt_watcher(shutdown.clone());

        let factory: Arc<dyn SessionFactory> =
            Arc::new(ChromeSessionFactory::new(self.config.headless));
        let (records, stats) =
            scheduler::run_pool(factory, self.config.clone(), shutdown).await;

        // 中断时也先把已收集的部分落盘，采集成果不能丢
        storage::save_records(&self.config.output_json, &records)?;
        print_final_stats(&stats);

        Ok(records)
    }
}

/// 挂接 Ctrl-C：置位关闭标志，让各线程停止发起新请求
fn spawn_interrupt_watcher(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ 收到中断信号，等待在途请求结束后导出已收集的结果");
            shutdown.store(true, Ordering::SeqCst);
        }
    });
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - CTET成绩批量抓取");
    info!(
        "📋 准考证号区间: {} - {} (共 {} 个)",
        config.start_roll,
        config.end_roll,
        config.requested_count()
    );
    info!("📊 工作线程数: {}", config.worker_count);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(stats: &RunStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 抓取完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功收集: {}/{}", stats.collected, stats.requested);
    info!("⛔ 无效号码: {}", stats.invalid);
    info!("❌ 永久缺失: {}", stats.missed);
    info!("{}", "=".repeat(60));
}
