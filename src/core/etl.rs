use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::disabled(),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs extract, transform and load in order and returns the output
    /// location reported by the pipeline.
    pub async fn run(&self) -> Result<String> {
        let name = self.pipeline.name();
        tracing::info!("Starting {}", name);

        // Extract
        tracing::info!("[{}] extracting...", name);
        let extracted = self.pipeline.extract().await?;
        self.monitor.log_phase("Extract");

        // Transform
        tracing::info!("[{}] transforming...", name);
        let transformed = self.pipeline.transform(extracted).await?;
        self.monitor.log_phase("Transform");

        // Load
        tracing::info!("[{}] loading...", name);
        let output_path = self.pipeline.load(transformed).await?;
        self.monitor.log_phase("Load");
        self.monitor.log_final_stats();

        tracing::info!("[{}] output saved to: {}", name, output_path);
        Ok(output_path)
    }
}
