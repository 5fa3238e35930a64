use invoice_audit_hub::{api, AppConfig, AuditDesk, FallbackSimulator, HttpWorkflowBackend};
use std::sync::Arc;
use tracing::{info, warn};
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
    let config = AppConfig::load()?;
    info!("Starting audit hub with config: {:?}", config);

    // 后端客户端 + 本地模拟器
    let backend = Arc::new(HttpWorkflowBackend::new(&config.backend)?);
    let simulator = FallbackSimulator::new(&config.simulation);
    let desk = AuditDesk::new(backend, simulator, &config.audit);

    // 启动时同步一次队列，失败则降级为模拟数据
    match desk.refresh().await {
        Ok(()) => info!("Initial queue loaded from {}", config.backend.base_url),
        Err(e) => warn!("Backend unreachable ({}), running in simulated mode", e),
    }

    let app = api::router(desk);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET    /api/queue?status=&search=");
    info!("  POST   /api/queue/refresh");
    info!("  POST   /api/invoices/:invoice_id/audit");
    info!("  GET    /api/session");
    info!("  POST   /api/session/approve | /api/session/dispute");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
