use erp_label_print::{api, create_engine, AppConfig, LabelService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 创建标签引擎与服务
    let engine = create_engine(&config);
    let service = Arc::new(LabelService::new(&config, engine)?);
    info!("Label engine: {}, printers: {:?}", service.engine_name(), service.printers());

    let app = api::router(service);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("ERP endpoint: {}", config.erp.base_url);
    info!("API Endpoints:");
    info!("  POST   /api/sessions                - load label template");
    info!("  POST   /api/sessions/:id/receipt    - query ERP receipt");
    info!("  PUT    /api/sessions/:id/overrides  - quantity / DC / HW / FW / product name");
    info!("  GET    /api/sessions/:id/preview    - preview label");
    info!("  POST   /api/sessions/:id/print      - print label");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
