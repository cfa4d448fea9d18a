use crate::core::Pipeline;
use crate::domain::model::CleanReport;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Result of one full run.
#[derive(Debug, Clone)]
pub struct EtlOutcome {
    pub output_location: String,
    pub report: CleanReport,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        tracing::info!("🚀 Starting ETL process");

        // Extract
        tracing::info!("📥 Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", raw_data.len());
        self.monitor.log_stats("extract", raw_data.len());

        // Transform
        tracing::info!("🔄 Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        let report = transformed.report.clone();
        tracing::info!(
            "Transformed {} records into {} rows x {} columns ({} duplicates removed, {} defaults filled)",
            report.input_rows,
            report.output_rows,
            report.output_columns.len(),
            report.duplicates_removed,
            report.defaults_filled
        );
        self.monitor.log_stats("transform", report.output_rows);

        // Load
        tracing::info!("💾 Loading data...");
        let output_location = self.pipeline.load(transformed).await?;
        tracing::info!("Output saved to: {}", output_location);
        self.monitor.log_stats("load", report.output_rows);

        self.monitor.log_final_stats();

        Ok(EtlOutcome {
            output_location,
            report,
        })
    }
}
