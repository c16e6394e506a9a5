//! chromiumoxide 浏览器会话
//!
//! [`crate::driver`] 能力接口的生产实现。每个会话启动一个独立的
//! Chromium 实例并持有唯一的 Page，会话之间互不共享。

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::driver::{PageDriver, PageElement, SessionFactory};
use crate::error::{DriverError, DriverResult};

/// 等待元素时的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 一个独占的浏览器会话
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    /// 启动浏览器并打开一个空白页面
    pub async fn launch(headless: bool) -> DriverResult<Self> {
        info!("🚀 启动浏览器会话 (headless: {})...", headless);

        let mut builder = BrowserConfig::builder().args(vec![
            "--disable-gpu",           // 无头模式下禁用 GPU
            "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage", // 防止共享内存不足
        ]);
        builder = if headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        let config = builder
            .build()
            .map_err(|message| DriverError::LaunchFailed { message })?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::LaunchFailed {
                message: e.to_string(),
            })?;

        // 在后台处理浏览器事件，会话关闭后事件流结束，任务随之退出
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 添加短暂延迟以等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        let page = browser.new_page("about:blank").await?;
        debug!("浏览器会话就绪");

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }
}

#[async_trait]
impl PageDriver for ChromeSession {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::NavigationFailed {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> DriverResult<Box<dyn PageElement>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(Box::new(ChromeElement { inner: element }));
            }
            if Instant::now() >= deadline {
                return Err(DriverError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>> {
        let elements = self.page.find_elements(selector).await.unwrap_or_default();
        Ok(wrap_elements(elements))
    }

    async fn close(self: Box<Self>) -> DriverResult<()> {
        let ChromeSession {
            mut browser,
            page: _,
            handler_task,
        } = *self;
        match browser.close().await {
            Ok(_) => {
                // 事件流随浏览器退出而结束
                let _ = handler_task.await;
            }
            Err(_) => handler_task.abort(),
        }
        debug!("浏览器会话已关闭");
        Ok(())
    }
}

/// chromiumoxide 元素的能力包装
struct ChromeElement {
    inner: Element,
}

#[async_trait]
impl PageElement for ChromeElement {
    async fn text(&self) -> DriverResult<String> {
        Ok(self.inner.inner_text().await?.unwrap_or_default())
    }

    async fn click(&self) -> DriverResult<()> {
        self.inner.click().await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        self.inner.type_str(text).await?;
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        // CDP 没有原生的清空操作，直接置空 value
        self.inner
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>> {
        let elements = self.inner.find_elements(selector).await.unwrap_or_default();
        Ok(wrap_elements(elements))
    }
}

fn wrap_elements(elements: Vec<Element>) -> Vec<Box<dyn PageElement>> {
    elements
        .into_iter()
        .map(|inner| Box::new(ChromeElement { inner }) as Box<dyn PageElement>)
        .collect()
}

/// 每次开会话都启动一个新浏览器的工厂
pub struct ChromeSessionFactory {
    headless: bool,
}

impl ChromeSessionFactory {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open_session(&self) -> DriverResult<Box<dyn PageDriver>> {
        let session = ChromeSession::launch(self.headless).await?;
        Ok(Box::new(session))
    }
}
