use anyhow::Context;
use clap::Parser;
use wh_productivity::utils::{error::EtlError, logger, validation::Validate};
use wh_productivity::{
    AppState, CliConfig, EtlEngine, LocalStorage, ProductivityPipeline, UserMappingStore,
};

fn fail(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting wh-productivity CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        fail(&e);
    }

    // 載入使用者對照表，整個批次使用同一份快照
    let mappings = UserMappingStore::new(LocalStorage::new(config.mappings_path.clone()))
        .load()
        .await
        .with_context(|| format!("loading user mappings from {}", config.mappings_path))?;

    let tx_type = config.tx_type;
    let print = config.print;
    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let source = LocalStorage::new(".".to_string());
    let sink = LocalStorage::new(config.output_path.clone());
    let pipeline = ProductivityPipeline::new(source, sink, config, mappings.clone());
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let outcome = match engine.run().await {
        Ok(outcome) => outcome,
        Err(e) => fail(&e),
    };

    println!(
        "✅ {} batch processed: {} transactions from {} files",
        tx_type,
        outcome.batch.transactions,
        outcome.batch.files.len()
    );
    for path in &outcome.written {
        println!("📁 Output saved to: {}", path);
    }

    let mut state = AppState::new(mappings);
    state.record(outcome.batch.report);
    state.select(tx_type);

    if print {
        match state.copy_current() {
            Ok(payload) => println!("\n{}", payload.text),
            Err(e) => fail(&e),
        }
    }

    Ok(())
}
