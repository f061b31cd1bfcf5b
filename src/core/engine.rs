use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a [`Pipeline`] through extract, transform and load.
pub struct SynthEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> SynthEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting synthetic data generation");
        if self.monitor.is_enabled() {
            tracing::debug!("System monitoring active for this run");
        }
        self.monitor.log_stats("start");

        tracing::info!("📥 Extracting source data...");
        let source = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} records with {} columns",
            source.len(),
            source.columns.len()
        );
        self.monitor.log_stats("extract");

        tracing::info!("🔄 Analysing and generating...");
        let outcome = self.pipeline.transform(source).await?;
        tracing::info!(
            "🔄 Generated {} records (quality score {:.1}, accuracy {:.1})",
            outcome.result.data.len(),
            outcome.analysis.quality_score,
            outcome.result.metadata.quality.accuracy
        );
        self.monitor.log_stats("transform");

        tracing::info!("💾 Writing output...");
        let output_path = self.pipeline.load(outcome).await?;
        tracing::info!("💾 Output saved to: {}", output_path);
        self.monitor.log_stats("load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis;
    use crate::core::generator::SyntheticDataGenerator;
    use crate::domain::model::{Dataset, GenerationConfig, GenerationOutcome, Record};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<Dataset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut record = Record::new();
            record.insert("score", json!(1));
            Ok(Dataset::from_records(vec![record]))
        }

        async fn transform(&self, data: Dataset) -> Result<GenerationOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let analysis = analysis::analyze(&data)?;
            let config = GenerationConfig {
                record_count: 3,
                ..GenerationConfig::default()
            };
            let result = SyntheticDataGenerator::new(Some(1)).generate(&data, &analysis, &config)?;
            Ok(GenerationOutcome { analysis, result })
        }

        async fn load(&self, outcome: GenerationOutcome) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("out/{}.csv", outcome.result.data.len()))
        }
    }

    #[tokio::test]
    async fn test_run_calls_every_phase() {
        let engine = SynthEngine::new(CountingPipeline {
            calls: AtomicUsize::new(0),
        });
        let path = engine.run().await.unwrap();
        assert_eq!(path, "out/3.csv");
        assert_eq!(engine.pipeline.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_extract_error_stops_run() {
        struct Failing;

        #[async_trait]
        impl Pipeline for Failing {
            async fn extract(&self) -> Result<Dataset> {
                Err(crate::utils::error::SynthError::processing("boom"))
            }
            async fn transform(&self, _data: Dataset) -> Result<GenerationOutcome> {
                unreachable!()
            }
            async fn load(&self, _outcome: GenerationOutcome) -> Result<String> {
                unreachable!()
            }
        }

        let err = SynthEngine::new_with_monitoring(Failing, false).run().await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
