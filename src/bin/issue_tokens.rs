use clap::Parser;
use trustkit::config::TokenArgs;
use trustkit::utils::logger;
use trustkit::utils::validation::Validate;
use trustkit::{EtlEngine, LocalStorage, TokenPipeline, TrustkitError};

fn exit_with(e: &TrustkitError) -> ! {
    tracing::error!(
        "❌ Token issuance failed: {} (Category: {:?}, Severity: {:?})",
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
    // 先載入 .env，讓 clap 能讀到環境變數
    dotenvy::dotenv().ok();
    let args = TokenArgs::parse();

    // 初始化日誌
    logger::init(args.connection.verbose, args.connection.log_json);
    tracing::info!("🚀 Starting issue-tokens");

    let profile = args
        .connection
        .load_profile()
        .unwrap_or_else(|e| exit_with(&e));
    let connection = args
        .connection
        .resolve(&profile)
        .unwrap_or_else(|e| exit_with(&e));
    let job = args.resolve(&profile).unwrap_or_else(|e| exit_with(&e));

    // 驗證配置
    if let Err(e) = connection.validate().and_then(|_| job.validate()) {
        exit_with(&e);
    }
    tracing::debug!("Connection: {:?}", connection);
    tracing::debug!("Job: {:?}", job);

    let storage = LocalStorage::new(connection.output_path.clone());
    let pipeline = TokenPipeline::new(storage, connection, job).unwrap_or_else(|e| exit_with(&e));
    let engine = EtlEngine::new_with_monitoring(pipeline, args.connection.monitor);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Process tokens saved to {}", output_path);
            println!("✅ Process tokens saved to {}", output_path);
        }
        Err(e) => exit_with(&e),
    }
}
