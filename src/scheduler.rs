//! 工作线程池与分片调度
//!
//! 把准考证号区间切成至多 N 个连续分片，每个工作线程独占一个浏览器会话，
//! 顺序处理自己的分片。成功记录追加进互斥锁保护的共享聚合，这是唯一跨
//! 线程的可变状态。线程崩溃在分片边界捕获，不影响其他线程和已收集的记录。

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::aggregate::Aggregate;
use crate::config::Config;
use crate::driver::SessionFactory;
use crate::fetch::{fetch_with_retry, FetchOutcome};
use crate::models::Record;

/// 连续的准考证号分片，闭区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollSlice {
    pub start: u64,
    pub end: u64,
}

impl RollSlice {
    /// 分片内的号码数，构造时保证非空
    pub fn count(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// 运行统计
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    /// 请求的号码总数
    pub requested: u64,
    /// 成功收集的记录数
    pub collected: usize,
    /// 页面提示无效的号码数
    pub invalid: usize,
    /// 重试耗尽的永久缺失数
    pub missed: usize,
}

/// 单个工作线程的处理统计
#[derive(Debug, Default)]
struct WorkerStats {
    invalid: usize,
    missed: usize,
}

/// 把 [start, end] 切成至多 worker_count 个近似等长的连续分片
///
/// 每片 total / workers 个号码，余数全部给最后一片；
/// 区间比线程数还小时，只产生单号分片。
pub fn partition_rolls(start: u64, end: u64, worker_count: usize) -> Vec<RollSlice> {
    if start > end || worker_count == 0 {
        return Vec::new();
    }
    let total = end - start + 1;
    let workers = (worker_count as u64).min(total);
    let base = total / workers;

    let mut slices = Vec::with_capacity(workers as usize);
    let mut cursor = start;
    for i in 0..workers {
        let size = if i == workers - 1 {
            end - cursor + 1
        } else {
            base
        };
        slices.push(RollSlice {
            start: cursor,
            end: cursor + size - 1,
        });
        cursor += size;
    }
    slices
}

/// 运行工作线程池，返回收集到的全部记录和统计
///
/// shutdown 置位后各线程不再发起新请求，已收集的记录照常返回。
pub async fn run_pool(
    factory: Arc<dyn SessionFactory>,
    config: Arc<Config>,
    shutdown: Arc<AtomicBool>,
) -> (Vec<Record>, RunStats) {
    let slices = partition_rolls(config.start_roll, config.end_roll, config.worker_count);
    let aggregate = Arc::new(Mutex::new(Aggregate::new()));

    let mut handles = Vec::with_capacity(slices.len());
    for (idx, slice) in slices.iter().enumerate() {
        let worker_id = idx + 1;
        let handle = tokio::spawn(run_worker(
            worker_id,
            *slice,
            factory.clone(),
            config.clone(),
            aggregate.clone(),
            shutdown.clone(),
        ));
        handles.push((worker_id, handle));
    }

    let mut stats = RunStats {
        requested: config.requested_count(),
        ..Default::default()
    };

    // 在分片边界汇总，线程崩溃只损失该线程未提交的进度
    for (worker_id, handle) in handles {
        match handle.await {
            Ok(worker_stats) => {
                stats.invalid += worker_stats.invalid;
                stats.missed += worker_stats.missed;
            }
            Err(e) => {
                error!("[线程 {}] 任务崩溃: {}", worker_id, e);
            }
        }
    }

    let records = {
        let mut guard = aggregate.lock().await;
        std::mem::take(&mut *guard)
    }
    .into_records();
    stats.collected = records.len();

    (records, stats)
}

/// 单个工作线程：开会话、跑完分片、保证会话释放
async fn run_worker(
    worker_id: usize,
    slice: RollSlice,
    factory: Arc<dyn SessionFactory>,
    config: Arc<Config>,
    aggregate: Arc<Mutex<Aggregate>>,
    shutdown: Arc<AtomicBool>,
) -> WorkerStats {
    info!(
        "[线程 {}] 负责准考证号 {} - {} (共 {} 个)",
        worker_id,
        slice.start,
        slice.end,
        slice.count()
    );

    let driver = match factory.open_session().await {
        Ok(driver) => driver,
        Err(e) => {
            error!("[线程 {}] 打开浏览器会话失败: {}", worker_id, e);
            return WorkerStats::default();
        }
    };

    let result = AssertUnwindSafe(process_slice(
        worker_id,
        slice,
        driver.as_ref(),
        &config,
        &aggregate,
        &shutdown,
    ))
    .catch_unwind()
    .await;

    // 无论分片处理结果如何，哪怕崩溃，都要释放会话
    if let Err(e) = driver.close().await {
        warn!("[线程 {}] 关闭浏览器会话失败: {}", worker_id, e);
    }

    match result {
        Ok(stats) => {
            info!("[线程 {}] ✅ 分片处理完成", worker_id);
            stats
        }
        Err(_) => {
            error!("[线程 {}] 分片处理崩溃，已收集的记录不受影响", worker_id);
            WorkerStats::default()
        }
    }
}

/// 顺序处理分片内的每个准考证号
async fn process_slice(
    worker_id: usize,
    slice: RollSlice,
    driver: &dyn crate::driver::PageDriver,
    config: &Config,
    aggregate: &Mutex<Aggregate>,
    shutdown: &AtomicBool,
) -> WorkerStats {
    let mut stats = WorkerStats::default();

    for roll in slice.start..=slice.end {
        if shutdown.load(Ordering::SeqCst) {
            info!("[线程 {}] 收到中断信号，停止发起新请求", worker_id);
            break;
        }

        let report = fetch_with_retry(driver, roll, config).await;
        match report.outcome {
            FetchOutcome::Success(record) => {
                let inserted = aggregate.lock().await.insert(roll, *record);
                if inserted {
                    info!(
                        "[线程 {}] ✓ 准考证号 {} 抓取成功 (尝试 {} 次)",
                        worker_id, roll, report.attempts
                    );
                }
            }
            FetchOutcome::InvalidRoll => {
                stats.invalid += 1;
            }
            FetchOutcome::Exhausted { last_reason } => {
                stats.missed += 1;
                warn!(
                    "[线程 {}] ✗ 准考证号 {} 重试 {} 次后放弃: {}",
                    worker_id, roll, report.attempts, last_reason
                );
            }
        }

        // 同一会话内的两次查询之间稍作间隔，避免压垮远端
        sleep(config.request_delay()).await;
    }

    stats
}
