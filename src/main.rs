use bb_reconcile_rust::{api, data, AppConfig, NameResolver, ReconciliationEngine, TransactionPool};
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
    let config = AppConfig::from_env()?;
    info!("Loaded config: {:?}", config);

    match std::env::args().nth(1).as_deref() {
        Some("run") => run_batch(&config),
        _ => serve(config).await,
    }
}

/// 批量模式: 读取文件 -> 对账 -> 导出 CSV
fn run_batch(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let input = &config.input;
    let transactions = data::load_transactions(&input.bank_path)?;
    let receivables = data::load_receivables(&input.receivables_path)?;
    let dictionary = data::load_dictionary(&input.dictionary_path)?;

    let resolver = NameResolver::from_dictionary(&dictionary)?;
    let pool = TransactionPool::new(transactions);
    let mut engine = ReconciliationEngine::new(resolver, pool, &config.matching)?;

    let report = engine.reconcile(&receivables)?;
    data::export_to_csv(&report.results, &input.output_path)?;

    info!(
        "Reconciliation complete: {}/{} matched, {} transactions consumed. Results saved to {}",
        report.stats.matched(),
        report.stats.total,
        report.stats.transactions_consumed,
        input.output_path.display()
    );
    Ok(())
}

/// 服务模式
async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = api::router(config.matching.clone()).layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /health");
    info!("  POST /api/reconcile");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
