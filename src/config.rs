use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 起始准考证号（包含）
    pub start_roll: u64,
    /// 结束准考证号（包含）
    pub end_roll: u64,
    /// 并发工作线程数，每个线程独占一个浏览器会话
    pub worker_count: usize,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 成绩查询页面URL
    pub target_url: String,
    /// 抓取结果JSON输出路径
    pub output_json: String,
    /// Excel导出路径
    pub output_xlsx: String,
    /// 单个准考证号的最大尝试次数
    pub max_attempts: u32,
    /// 页面元素等待超时（秒）
    pub wait_timeout_secs: u64,
    /// 提交查询后的固定等待时间（毫秒），页面没有完成信号可等
    pub settle_delay_ms: u64,
    /// 两次重试之间的等待时间（毫秒）
    pub retry_delay_ms: u64,
    /// 同一会话内两次查询之间的间隔（毫秒）
    pub request_delay_ms: u64,
    /// 跳过抓取，仅从已有JSON导出Excel
    pub export_only: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_roll: 218100001,
            end_roll: 218100100,
            worker_count: 5,
            headless: true,
            target_url: "https://cbseresults.nic.in/CtetDec24/CtetDec24q.htm".to_string(),
            output_json: "ctet_results.json".to_string(),
            output_xlsx: "ctet_results.xlsx".to_string(),
            max_attempts: 3,
            wait_timeout_secs: 10,
            settle_delay_ms: 1000,
            retry_delay_ms: 1000,
            request_delay_ms: 500,
            export_only: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：可选的 config.toml 打底，环境变量逐字段覆盖
    pub fn load() -> Self {
        Self::from_file("config.toml")
            .unwrap_or_default()
            .apply_env()
    }

    /// 从TOML文件读取配置，文件不存在或解析失败时返回 None
    pub fn from_file(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("⚠️ 配置文件 {} 解析失败，使用默认配置: {}", path.display(), e);
                None
            }
        }
    }

    /// 用环境变量覆盖各字段
    pub fn apply_env(self) -> Self {
        Self {
            start_roll: env_or("START_ROLL", self.start_roll),
            end_roll: env_or("END_ROLL", self.end_roll),
            // 至少一个工作线程
            worker_count: env_or("WORKER_COUNT", self.worker_count).max(1),
            headless: env_or("HEADLESS", self.headless),
            target_url: std::env::var("TARGET_URL").unwrap_or(self.target_url),
            output_json: std::env::var("OUTPUT_JSON").unwrap_or(self.output_json),
            output_xlsx: std::env::var("OUTPUT_XLSX").unwrap_or(self.output_xlsx),
            max_attempts: env_or("MAX_ATTEMPTS", self.max_attempts).max(1),
            wait_timeout_secs: env_or("WAIT_TIMEOUT_SECS", self.wait_timeout_secs),
            settle_delay_ms: env_or("SETTLE_DELAY_MS", self.settle_delay_ms),
            retry_delay_ms: env_or("RETRY_DELAY_MS", self.retry_delay_ms),
            request_delay_ms: env_or("REQUEST_DELAY_MS", self.request_delay_ms),
            export_only: env_or("EXPORT_ONLY", self.export_only),
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging),
        }
    }

    /// 请求的准考证号总数
    pub fn requested_count(&self) -> u64 {
        if self.end_roll >= self.start_roll {
            self.end_roll - self.start_roll + 1
        } else {
            0
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
