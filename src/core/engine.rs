use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub output_path: String,
    pub collected: usize,
    pub kept: usize,
    pub duplicates: usize,
    pub filtered_out: usize,
    pub texts: Vec<String>,
}

pub struct HarvestEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> HarvestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<HarvestReport> {
        tracing::info!("Starting harvest");

        let tweets = self.pipeline.extract().await?;
        let collected = tweets.len();
        self.monitor.log_stats("extract");

        let result = self.pipeline.transform(tweets).await?;
        tracing::info!(
            "Kept {} of {} tweets ({} duplicates, {} filtered)",
            result.tweets.len(),
            collected,
            result.duplicates,
            result.filtered_out
        );
        self.monitor.log_stats("transform");

        let kept = result.tweets.len();
        let duplicates = result.duplicates;
        let filtered_out = result.filtered_out;
        let texts = result.tweets.iter().map(|t| t.text.clone()).collect();

        let output_path = self.pipeline.load(result).await?;
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        Ok(HarvestReport {
            output_path,
            collected,
            kept,
            duplicates,
            filtered_out,
            texts,
        })
    }
}
