use anyhow::Result;
use aurodiary::config::Config;
use aurodiary::server;
use aurodiary::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env（不存在时忽略）
    dotenvy::dotenv().ok();

    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 启动 HTTP 服务
    server::run(config).await
}
