use clap::Parser;
use trustkit::config::AuditArgs;
use trustkit::utils::logger;
use trustkit::utils::validation::Validate;
use trustkit::{AuditPipeline, EtlEngine, LocalStorage, TrustkitError};

fn exit_with(e: &TrustkitError) -> ! {
    tracing::error!(
        "❌ Instance audit failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code().max(1));
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = AuditArgs::parse();

    // 初始化日誌
    logger::init(args.connection.verbose, args.connection.log_json);
    tracing::info!("🚀 Starting audit-instances");

    let profile = args
        .connection
        .load_profile()
        .unwrap_or_else(|e| exit_with(&e));
    let connection = args
        .connection
        .resolve(&profile)
        .unwrap_or_else(|e| exit_with(&e));
    let job = args.resolve(&profile);

    // 驗證配置
    if let Err(e) = connection.validate().and_then(|_| job.validate()) {
        exit_with(&e);
    }
    tracing::debug!("Connection: {:?}", connection);
    tracing::debug!("Job: {:?}", job);

    let storage = LocalStorage::new(connection.output_path.clone());
    let pipeline = AuditPipeline::new(storage, connection, job).unwrap_or_else(|e| exit_with(&e));
    let engine = EtlEngine::new_with_monitoring(pipeline, args.connection.monitor);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Spreadsheet created: {}", output_path);
            println!("✅ Spreadsheet created: {}", output_path);
        }
        Err(e) => exit_with(&e),
    }
}
