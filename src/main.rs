use invoice_desk::{api, AppConfig, DeskService, WebhookStore};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    // 远程 webhook 存储
    let store = Arc::new(WebhookStore::new(config.clone())?);
    let desk = Arc::new(DeskService::new(store));
    info!("Invoice store: {}", config.remote.base_url);

    let app = api::router(desk).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/sessions                 - open a queue view");
    info!("  POST /api/sessions/:id/sort|page   - change view state");
    info!("  POST /api/invoices/:id/approve     - forward a decision");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
