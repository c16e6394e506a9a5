use anyhow::Result;
use ctet_result_scraper::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    ctet_result_scraper::logger::init();

    // 加载配置
    let config = Config::load();

    // 初始化并运行应用
    App::new(config).run().await?;

    Ok(())
}
