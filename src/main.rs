use pms_import_rust::{api, create_pool, AppConfig, ParseOptions, PgImportRepository, PmsImporter, StaffDirectory};
use std::sync::Arc;
use tower::ServiceBuilder;
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
    info!("Starting server with config: {:?}", config.server);

    // 创建数据库连接池
    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    let staff = StaffDirectory::new(config.import.staff.clone());
    if staff.is_empty() {
        tracing::warn!("Staff code table is empty, imported visits will not be attributed to staff");
    }
    info!("Loaded {} staff codes", staff.len());

    let options = ParseOptions {
        phone_scan_lines: config.import.phone_scan_lines,
        country_code: config.import.country_code.clone(),
    };
    let importer = Arc::new(PmsImporter::new(PgImportRepository::new(pool), staff, options));

    let app = api::router(importer).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/import/pms          - import one extracted document");
    info!("  POST /api/import/pms/batch    - import several documents");
    info!("  POST /api/import/pms/preview  - parse only, no writes");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
