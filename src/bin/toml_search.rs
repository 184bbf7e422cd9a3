use anyhow::Context;
use clap::Parser;
use twitter_search::core::ConfigProvider;
use twitter_search::domain::options::SearchApi;
use twitter_search::utils::{logger, validation::Validate};
use twitter_search::{HarvestEngine, LocalStorage, SearchPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-search")]
#[command(about = "Twitter search driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "twitter-search.toml")]
    config: String,

    /// Override the query from the config file
    #[arg(short, long)]
    query: Option<String>,

    /// Override which search API to use
    #[arg(long, value_enum)]
    api: Option<SearchApi>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Print each tweet's text after the run
    #[arg(long)]
    print: bool,

    #[arg(long)]
    json_logs: bool,

    /// Dry run - show the request that would be made without executing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_logger(args.verbose, args.json_logs);

    tracing::info!("🚀 Starting TOML-based twitter search");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    // 應用命令列覆蓋設定
    if let Some(query) = &args.query {
        config.search.query = query.clone();
        tracing::info!("🔧 Query overridden to: {:?}", query);
    }
    if let Some(api) = args.api {
        config.search.api = api;
        tracing::info!("🔧 API overridden to: {}", api.as_str());
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output().data_dir);
    let pipeline = SearchPipeline::new(storage, config).context("failed to build HTTP client")?;

    if args.dry_run {
        println!("🔍 Dry run, request that would be sent:");
        println!("{}", pipeline.preview()?);
        return Ok(());
    }

    let engine = HarvestEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            if args.print {
                for text in &report.texts {
                    println!("{}\n", text);
                }
            }
            println!(
                "✅ Collected {} tweets, kept {} ({} duplicates, {} filtered)",
                report.collected, report.kept, report.duplicates, report.filtered_out
            );
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Harvest failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Query: {}", config.query());
    println!("  API: {}", config.api().as_str());
    match config.api() {
        SearchApi::Standard => {
            let standard = config.standard();
            println!(
                "  Result type: {}, count: {}",
                standard.result_type.as_str(),
                standard.count
            );
            if let Some(max) = standard.max_results {
                println!("  Max results: {}", max);
            }
        }
        SearchApi::Premium => {
            let premium = config.premium();
            println!(
                "  Endpoint: {}",
                premium.endpoint.as_deref().unwrap_or("<unset>")
            );
            println!(
                "  Results per call: {}, max results: {}",
                premium.results_per_call, premium.max_results
            );
        }
    }
    let output = config.output();
    println!("  Output: {}", output.data_dir);
    let formats: Vec<String> = output
        .formats
        .iter()
        .map(|f| format!("{:?}", f).to_lowercase())
        .collect();
    println!("  Formats: {}", formats.join(", "));
    if let Some(archive) = &output.archive {
        println!("  Archive: {}", archive);
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}
