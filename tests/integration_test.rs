use ctet_result_scraper::config::Config;
use ctet_result_scraper::driver::SessionFactory;
use ctet_result_scraper::fetch::{fetch_with_retry, FetchOutcome};
use ctet_result_scraper::{logger, ChromeSessionFactory};

#[tokio::test]
#[ignore] // 默认忽略，需要本机有Chrome，手动运行：cargo test -- --ignored
async fn test_browser_session_launch_and_close() {
    // 初始化日志
    logger::init();

    let factory = ChromeSessionFactory::new(true);
    let driver = factory.open_session().await.expect("应该能够启动浏览器会话");

    driver.close().await.expect("应该能够关闭浏览器会话");
}

#[tokio::test]
#[ignore]
async fn test_fetch_single_roll_from_live_source() {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::load();

    let factory = ChromeSessionFactory::new(config.headless);
    let driver = factory.open_session().await.expect("连接浏览器失败");

    let report = fetch_with_retry(driver.as_ref(), config.start_roll, &config).await;
    println!("尝试次数: {}, 结果: {:?}", report.attempts, report.outcome);

    // 真实号码可能有效也可能无效，只要求流程走完并给出明确分类
    assert!(matches!(
        report.outcome,
        FetchOutcome::Success(_) | FetchOutcome::InvalidRoll | FetchOutcome::Exhausted { .. }
    ));

    driver.close().await.expect("关闭浏览器会话失败");
}
