use clap::Parser;
use twitter_search::core::ConfigProvider;
use twitter_search::utils::{logger, validation::Validate};
use twitter_search::{CliConfig, HarvestEngine, LocalStorage, SearchError, SearchPipeline};

fn fail(e: &SearchError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
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
async fn main() {
    let config = CliConfig::parse();

    logger::init_logger(config.verbose, config.json_logs);
    tracing::info!("Starting twitter-search");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let print = config.print;
    let dry_run = config.dry_run;
    let monitor_enabled = config.monitor;
    let storage = LocalStorage::new(config.output().data_dir);
    let pipeline = match SearchPipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(&e),
    };

    if dry_run {
        match pipeline.preview() {
            Ok(preview) => println!("{}", preview),
            Err(e) => fail(&e),
        }
        return;
    }

    let engine = HarvestEngine::new_with_monitoring(pipeline, monitor_enabled);
    match engine.run().await {
        Ok(report) => {
            if print {
                for text in &report.texts {
                    println!("{}\n", text);
                }
            }
            tracing::info!("✅ Collected {} tweets, kept {}", report.collected, report.kept);
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => fail(&e),
    }
}
