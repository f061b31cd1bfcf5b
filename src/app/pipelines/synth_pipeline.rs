use crate::core::{analysis, export, parser, samples};
use crate::core::generator::SyntheticDataGenerator;
use crate::domain::model::{DataSource, Dataset, GenerationOutcome};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{Result, SynthError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// Base name of the generated data file, inside or outside a bundle.
pub const DATA_FILE_STEM: &str = "synthetic_data";

pub struct SynthPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> SynthPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<Dataset> {
        tracing::debug!("Fetching source data from: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!("Source response status: {}", status);

        if !status.is_success() {
            return Err(SynthError::processing(format!(
                "Source request to {} failed with status {}",
                url, status
            )));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        let bytes = response.bytes().await?;

        if is_json {
            return parser::parse_json(&bytes);
        }
        parser::parse_bytes(&file_name_of(url)?, &bytes)
    }
}

/// Last path segment of `url`, used to pick a parser by extension.
fn file_name_of(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| SynthError::InvalidConfigValueError {
        field: "source.url".to_string(),
        value: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_string())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SynthPipeline<S, C> {
    async fn extract(&self) -> Result<Dataset> {
        let source = self.config.source();
        tracing::debug!("Extracting from source: {}", source);

        let dataset = match source {
            DataSource::File { path } => {
                let bytes = self.storage.read_file(path).await?;
                parser::parse_bytes(path, &bytes)?
            }
            DataSource::Url { url } => self.fetch_url(url).await?,
            DataSource::Sample { id, records } => {
                samples::generate_sample_data(id, *records, self.config.generation().seed)?
            }
        };

        if dataset.is_empty() {
            tracing::warn!("Source {} contained no records", source);
        }
        Ok(dataset)
    }

    async fn transform(&self, data: Dataset) -> Result<GenerationOutcome> {
        let generation = self.config.generation();
        let analysis = analysis::analyze(&data)?;
        tracing::debug!(
            "Source quality score {:.1}, privacy score {:.1}",
            analysis.quality_score,
            analysis.privacy_score
        );

        let mut generator = SyntheticDataGenerator::new(generation.seed);
        let result = generator.generate(&data, &analysis, generation)?;
        Ok(GenerationOutcome { analysis, result })
    }

    async fn load(&self, outcome: GenerationOutcome) -> Result<String> {
        let format = self.config.generation().format;
        let (body, extension, _) = export::render(&outcome.result.data, format)?;
        let data_file = format!("{}.{}", DATA_FILE_STEM, extension);

        let file_name = match self.config.bundle_name() {
            Some(bundle_name) => {
                let entries = vec![
                    (data_file, body),
                    (
                        "analysis.json".to_string(),
                        serde_json::to_vec_pretty(&outcome.analysis)?,
                    ),
                    (
                        "metadata.json".to_string(),
                        serde_json::to_vec_pretty(&outcome.result.metadata)?,
                    ),
                ];
                let zip_data = export::bundle(&entries)?;
                tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
                self.storage.write_file(bundle_name, &zip_data).await?;
                bundle_name.to_string()
            }
            None => {
                tracing::debug!("Writing {} ({} bytes) to storage", data_file, body.len());
                self.storage.write_file(&data_file, &body).await?;
                data_file
            }
        };

        Ok(format!("{}/{}", self.config.output_path(), file_name))
    }
}
