//! 单个准考证号的抓取与重试
//!
//! 每次尝试走同一个状态机：加载查询页 → 填号提交 → 固定等待 → 分类结果。
//! 瞬态失败和解析残缺都在重试上限内重试，耗尽后该号码记为永久缺失，
//! 单个号码的失败不会中断整批处理。

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::driver::PageDriver;
use crate::extract::{self, ExtractError};
use crate::models::Record;

/// 查询输入框
const ROLL_INPUT_SELECTOR: &str = "input[name='regno']";
/// 提交按钮
const SUBMIT_BUTTON_SELECTOR: &str = "input[name='B1']";
/// 无效号码提示的识别文本
const INVALID_INDICATOR_TEXT: &str = "Invalid";

/// 一个准考证号的最终抓取结果
#[derive(Debug)]
pub enum FetchOutcome {
    /// 成功提取到记录
    Success(Box<Record>),
    /// 页面明确提示号码无效，这是有效的否定结果，不重试
    InvalidRoll,
    /// 重试次数耗尽后的永久缺失
    Exhausted { last_reason: String },
}

/// 抓取报告：最终结果与实际尝试次数
#[derive(Debug)]
pub struct FetchReport {
    pub outcome: FetchOutcome,
    pub attempts: u32,
}

/// 单次尝试的分类结果
#[derive(Debug)]
enum AttemptOutcome {
    Success(Box<Record>),
    InvalidRoll,
    /// 瞬态失败，可重试
    Transient(String),
    /// 页面解析残缺，同样按可重试处理，反复出现时升级为永久缺失
    Malformed(String),
}

/// 抓取单个准考证号，最多尝试 `config.max_attempts` 次
pub async fn fetch_with_retry(driver: &dyn PageDriver, roll: u64, config: &Config) -> FetchReport {
    let mut attempts = 0;
    let mut last_reason = String::new();

    while attempts < config.max_attempts {
        attempts += 1;
        match run_attempt(driver, roll, config).await {
            AttemptOutcome::Success(record) => {
                return FetchReport {
                    outcome: FetchOutcome::Success(record),
                    attempts,
                };
            }
            AttemptOutcome::InvalidRoll => {
                info!("准考证号 {} 无效", roll);
                return FetchReport {
                    outcome: FetchOutcome::InvalidRoll,
                    attempts,
                };
            }
            AttemptOutcome::Transient(reason) => {
                warn!(
                    "准考证号 {} 第 {}/{} 次尝试失败: {}",
                    roll, attempts, config.max_attempts, reason
                );
                last_reason = reason;
            }
            AttemptOutcome::Malformed(reason) => {
                // 实时渲染页面上的解析残缺多半是渲染竞态，按瞬态失败重试
                warn!(
                    "准考证号 {} 第 {}/{} 次尝试解析残缺: {}",
                    roll, attempts, config.max_attempts, reason
                );
                last_reason = reason;
            }
        }
        if attempts < config.max_attempts {
            tokio::time::sleep(config.retry_delay()).await;
        }
    }

    FetchReport {
        outcome: FetchOutcome::Exhausted { last_reason },
        attempts,
    }
}

/// 执行一次完整的查询尝试
async fn run_attempt(driver: &dyn PageDriver, roll: u64, config: &Config) -> AttemptOutcome {
    // LoadPage：打开查询页并等输入框出现
    if let Err(e) = driver.navigate(&config.target_url).await {
        return AttemptOutcome::Transient(format!("页面加载失败: {}", e));
    }
    let input = match driver
        .wait_for(ROLL_INPUT_SELECTOR, config.wait_timeout())
        .await
    {
        Ok(element) => element,
        Err(e) => return AttemptOutcome::Transient(format!("查询输入框未出现: {}", e)),
    };

    // FillAndSubmit：清空、填号、点提交
    if let Err(e) = input.clear().await {
        return AttemptOutcome::Transient(format!("清空输入框失败: {}", e));
    }
    if let Err(e) = input.send_keys(&roll.to_string()).await {
        return AttemptOutcome::Transient(format!("填写准考证号失败: {}", e));
    }
    let submit = match driver
        .wait_for(SUBMIT_BUTTON_SELECTOR, config.wait_timeout())
        .await
    {
        Ok(element) => element,
        Err(e) => return AttemptOutcome::Transient(format!("提交按钮未出现: {}", e)),
    };
    if let Err(e) = submit.click().await {
        return AttemptOutcome::Transient(format!("点击提交失败: {}", e));
    }

    // Wait：页面没有完成信号可等，只能固定等待
    tokio::time::sleep(config.settle_delay()).await;

    // Classify：先看错误提示，再尝试提取
    match has_invalid_indicator(driver).await {
        Ok(true) => return AttemptOutcome::InvalidRoll,
        Ok(false) => {}
        Err(e) => return AttemptOutcome::Transient(format!("错误提示检查失败: {}", e)),
    }

    match extract::extract_record(driver).await {
        Ok(record) => {
            debug!("准考证号 {} 提取成功", roll);
            AttemptOutcome::Success(Box::new(record))
        }
        Err(ExtractError::Malformed(reason)) => AttemptOutcome::Malformed(reason),
        Err(ExtractError::Driver(e)) => AttemptOutcome::Transient(format!("页面读取失败: {}", e)),
    }
}

/// 检查页面上是否有无效号码提示
async fn has_invalid_indicator(
    driver: &dyn PageDriver,
) -> Result<bool, crate::error::DriverError> {
    for element in driver.find_all("font").await? {
        if element.text().await?.contains(INVALID_INDICATOR_TEXT) {
            return Ok(true);
        }
    }
    Ok(false)
}
