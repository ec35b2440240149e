use anyhow::Context;
use clap::Parser;
use wh_productivity::config::toml_config::TomlConfig;
use wh_productivity::utils::{error::EtlError, logger, validation::Validate};
use wh_productivity::{
    AppState, EtlEngine, LocalStorage, OutputFormat, ProductivityPipeline, UserMappingStore,
};
use wh_productivity::domain::ports::ConfigProvider;

#[derive(Parser)]
#[command(name = "toml-batch")]
#[command(about = "Run every batch of a TOML job file (one table per transaction type)")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "wh-productivity.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show what would be processed without reading any file
    #[arg(long)]
    dry_run: bool,
}

fn report_error(e: &EtlError) {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("🚀 Starting job '{}' from {}", config.job.name, args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        report_error(&e);
        std::process::exit(e.exit_code().max(1));
    }
    let batches = config.batch_configs()?;

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        for batch in &batches {
            println!(
                "{}: {} -> {}",
                batch.tx_type,
                batch.files.join(", "),
                batch
                    .output_formats
                    .iter()
                    .map(|f| f.file_name(batch.tx_type))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let mappings = UserMappingStore::new(LocalStorage::new(config.mappings_path().to_string()))
        .load()
        .await
        .with_context(|| format!("loading user mappings from {}", config.mappings_path()))?;

    let mut state = AppState::new(mappings.clone());
    let mut failures = 0;
    let mut emailed = Vec::new();

    // 各批次互相獨立，單一批次失敗不影響其他類型
    for batch in batches {
        let tx_type = batch.tx_type;
        let writes_email = batch.output_formats().contains(&OutputFormat::Email);
        let source = LocalStorage::new(".".to_string());
        let sink = LocalStorage::new(config.output_path().to_string());
        let pipeline = ProductivityPipeline::new(source, sink, batch, mappings.clone());
        let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

        match engine.run().await {
            Ok(outcome) => {
                println!(
                    "✅ {}: {} workers, grand total {}",
                    tx_type,
                    outcome.batch.report.rows.len(),
                    outcome.batch.report.grand_total
                );
                state.record(outcome.batch.report);
                if writes_email {
                    emailed.push(tx_type);
                }
            }
            Err(e) => {
                failures += 1;
                report_error(&e);
            }
        }
    }

    // 每個成功的類型額外輸出一份可貼入郵件的表格
    let sink = LocalStorage::new(config.output_path().to_string());
    for file_name in state.write_email_tables(&sink, &emailed).await? {
        println!("📁 Output saved to: {}/{}", config.output_path(), file_name);
    }

    if failures > 0 {
        eprintln!("❌ {} batch(es) failed", failures);
        std::process::exit(1);
    }
    Ok(())
}
