//! 页面驱动能力抽象
//!
//! 把浏览器渲染引擎收敛为少量能力接口：导航、限时等待、查找、读文本、
//! 点击、输入。抓取和解析逻辑只依赖本模块的 trait，不认识 chromiumoxide，
//! 测试时可以换成模拟会话。

use async_trait::async_trait;
use std::time::Duration;

use crate::error::DriverResult;

/// 页面元素能力
#[async_trait]
pub trait PageElement: Send + Sync {
    /// 元素的可见文本
    async fn text(&self) -> DriverResult<String>;

    async fn click(&self) -> DriverResult<()>;

    async fn send_keys(&self, text: &str) -> DriverResult<()>;

    /// 清空输入框内容
    async fn clear(&self) -> DriverResult<()>;

    /// 在当前元素范围内查找所有匹配的子元素
    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>>;
}

/// 页面驱动能力
///
/// 一个实例对应一个独占的浏览器会话，由单个工作线程持有，
/// 用完必须调用 [`PageDriver::close`] 释放。
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// 在超时时间内等待元素出现，超时返回 [`DriverError::ElementTimeout`]
    ///
    /// [`DriverError::ElementTimeout`]: crate::error::DriverError::ElementTimeout
    async fn wait_for(&self, selector: &str, timeout: Duration)
        -> DriverResult<Box<dyn PageElement>>;

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>>;

    /// 关闭会话并释放浏览器资源
    async fn close(self: Box<Self>) -> DriverResult<()>;
}

/// 会话工厂：调度器为每个工作线程开一个独立会话
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> DriverResult<Box<dyn PageDriver>>;
}
