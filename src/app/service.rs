//! Generation jobs: validate a request, pick a data source, generate, store
//! the output plus a job record, and answer status and health queries.

use crate::core::analysis;
use crate::core::generator::{build_metadata, SyntheticDataGenerator};
use crate::core::heuristic::HeuristicGenerator;
use crate::core::router::ModelKind;
use crate::core::{export, samples, stats};
use crate::domain::model::{
    BiasMetrics, Dataset, GenerationConfig, OutputFormat, PrivacyLevel, PrivacyMetrics,
    QualityMetrics, Record, SyntheticDataResult,
};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, SynthError};
use crate::utils::validation::{validate_identifier, Validate};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

pub const SERVICE_NAME: &str = "synth-data";
pub const DATA_PREFIX: &str = "synthetic-data";
pub const JOBS_PREFIX: &str = "jobs";
pub const PREVIEW_SIZE: usize = 10;
pub const JOB_RETENTION_DAYS: i64 = 30;
/// Rows drawn from a catalogue dataset to profile before generating.
pub const SAMPLE_SOURCE_ROWS: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub user_id: String,
    /// Free-form data type; a catalogue id selects that sample as source.
    pub data_type: String,
    pub record_count: usize,
    pub format: String,
    pub columns: Vec<String>,
    /// Privacy label: `low`, `medium` or `high`.
    pub privacy: String,
    pub correlations: bool,
    pub seasonality: bool,
    pub missing_data: f64,
    pub outliers: f64,
    pub source_data: Option<Vec<Record>>,
    pub seed: Option<u64>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            data_type: String::new(),
            record_count: 0,
            format: "csv".to_string(),
            columns: Vec::new(),
            privacy: "medium".to_string(),
            correlations: false,
            seasonality: false,
            missing_data: 0.0,
            outliers: 0.0,
            source_data: None,
            seed: None,
        }
    }
}

impl GenerationRequest {
    fn generation_config(&self, format: OutputFormat) -> GenerationConfig {
        let mut config = GenerationConfig {
            record_count: self.record_count,
            format,
            selected_columns: self.columns.clone(),
            seed: self.seed,
            ..GenerationConfig::default()
        };
        config.quality.null_percentage = self.missing_data;
        config.quality.outlier_percentage = self.outliers;
        config.privacy.level = match self.privacy.to_lowercase().as_str() {
            "high" => PrivacyLevel::Maximum,
            "medium" => PrivacyLevel::Enhanced,
            _ => PrivacyLevel::Basic,
        };
        if config.privacy.level == PrivacyLevel::Maximum {
            config.privacy.anonymize = true;
            config.privacy.encrypt_sensitive = true;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Upload,
    Sample,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSummary {
    pub data_type: String,
    pub format: OutputFormat,
    pub columns: Vec<String>,
    pub source: SourceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub user_id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub generation_time_ms: u64,
    pub quality: QualityMetrics,
    pub privacy: PrivacyMetrics,
    pub bias: BiasMetrics,
    pub model_used: ModelKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub record_count: usize,
    pub location: String,
    pub metadata: ResponseMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<Record>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

pub fn data_key(user_id: &str, job_id: &str, extension: &str) -> String {
    format!("{}/{}/{}.{}", DATA_PREFIX, user_id, job_id, extension)
}

pub fn job_key(user_id: &str, job_id: &str) -> String {
    format!("{}/{}/{}.json", JOBS_PREFIX, user_id, job_id)
}

pub struct GenerationService<S: Storage> {
    storage: S,
}

impl<S: Storage> GenerationService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        if request.user_id.trim().is_empty()
            || request.data_type.trim().is_empty()
            || request.record_count == 0
        {
            return Err(SynthError::validation("Missing required fields"));
        }
        validate_identifier("user_id", &request.user_id)?;
        let format: OutputFormat = request.format.parse()?;
        let config = request.generation_config(format);
        config.validate()?;

        let job_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let model = ModelKind::select(
            request.record_count,
            &request.privacy,
            request.correlations,
            &request.data_type,
            request.seasonality,
        );
        tracing::info!(
            "🚀 Starting generation job {} for user {} ({} records, model {})",
            job_id,
            request.user_id,
            request.record_count,
            model
        );

        let (result, source) = self.produce(&request, &config)?;

        let (body, extension, content_type) = export::render(&result.data, format)?;
        let location = data_key(&request.user_id, &job_id, extension);
        tracing::debug!("Storing {} bytes of {} at {}", body.len(), content_type, location);
        self.storage.write_file(&location, &body).await?;

        let completed_at = Utc::now();
        let record = JobRecord {
            job_id: job_id.clone(),
            user_id: request.user_id.clone(),
            status: JobStatus::Completed,
            created_at: Some(started_at),
            completed_at: Some(completed_at),
            record_count: Some(result.data.len()),
            location: Some(location.clone()),
            model: Some(model),
            request: Some(RequestSummary {
                data_type: request.data_type.clone(),
                format,
                columns: result.data.columns.clone(),
                source,
            }),
            expires_at: Some(completed_at + Duration::days(JOB_RETENTION_DAYS)),
            message: None,
        };
        // The data is already stored, so a failed job record only costs status lookups.
        if let Err(e) = self.store_job(&record).await {
            tracing::warn!("Failed to store job metadata for {}: {}", job_id, e);
        }

        let preview: Option<Vec<Record>> = (format == OutputFormat::Json)
            .then(|| result.data.records.iter().take(PREVIEW_SIZE).cloned().collect());

        tracing::info!("✅ Job {} completed: {}", job_id, location);
        Ok(GenerationResponse {
            job_id,
            status: JobStatus::Completed,
            record_count: result.data.len(),
            location,
            metadata: ResponseMetadata {
                generation_time_ms: result.metadata.generation_time_ms,
                quality: result.metadata.quality,
                privacy: result.metadata.privacy,
                bias: result.metadata.bias,
                model_used: model,
                timestamp: completed_at,
            },
            preview,
        })
    }

    pub async fn job_status(&self, job_id: &str, user_id: &str) -> Result<JobRecord> {
        validate_identifier("job_id", job_id)?;
        validate_identifier("user_id", user_id)?;

        let stored = match self.storage.read_file(&job_key(user_id, job_id)).await {
            Ok(bytes) => match serde_json::from_slice::<JobRecord>(&bytes) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Unreadable job record for {}: {}", job_id, e);
                    None
                }
            },
            Err(e) => {
                tracing::debug!("No job record for {}: {}", job_id, e);
                None
            }
        };

        Ok(stored.unwrap_or_else(|| JobRecord {
            job_id: job_id.to_string(),
            user_id: user_id.to_string(),
            status: JobStatus::Completed,
            created_at: None,
            completed_at: None,
            record_count: None,
            location: None,
            model: None,
            request: None,
            expires_at: None,
            message: Some("job metadata not available".to_string()),
        }))
    }

    pub fn health(&self) -> HealthReport {
        let endpoints = [
            ("generate", "create a generation job"),
            ("status", "look up a job record"),
            ("health", "service health"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        HealthReport {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints,
        }
    }

    fn produce(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
    ) -> Result<(SyntheticDataResult, SourceKind)> {
        if let Some(rows) = &request.source_data {
            let source = Dataset::from_records(rows.clone());
            return Ok((statistical(&source, config)?, SourceKind::Upload));
        }

        if samples::find_sample(&request.data_type).is_some() {
            let source =
                samples::generate_sample_data(&request.data_type, SAMPLE_SOURCE_ROWS, request.seed)?;
            return Ok((statistical(&source, config)?, SourceKind::Sample));
        }

        if request.columns.is_empty() {
            return Err(SynthError::validation(
                "columns are required when no source data or sample dataset is given",
            ));
        }

        let started = Instant::now();
        let seed = request
            .seed
            .unwrap_or_else(|| Utc::now().timestamp_millis().unsigned_abs());
        let data = HeuristicGenerator::new(&request.data_type, Some(seed)).generate(
            &request.columns,
            request.record_count,
            request.missing_data,
        );
        let overall_bias = match analysis::analyze(&data) {
            Ok(profile) => stats::round_to(profile.bias_score, 2),
            Err(_) => 0.0,
        };
        let metadata = build_metadata(
            &data,
            config,
            seed,
            100.0,
            overall_bias,
            started.elapsed().as_millis() as u64,
        );
        Ok((SyntheticDataResult { data, metadata }, SourceKind::Heuristic))
    }

    async fn store_job(&self, record: &JobRecord) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(record)?;
        self.storage
            .write_file(&job_key(&record.user_id, &record.job_id), &bytes)
            .await
    }
}

fn statistical(source: &Dataset, config: &GenerationConfig) -> Result<SyntheticDataResult> {
    let profile = analysis::analyze(source)?;
    SyntheticDataGenerator::new(config.seed).generate(source, &profile, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| SynthError::StorageError {
                message: format!("File not found: {}", path),
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn request(data_type: &str, record_count: usize) -> GenerationRequest {
        GenerationRequest {
            user_id: "user-1".to_string(),
            data_type: data_type.to_string(),
            record_count,
            seed: Some(7),
            ..GenerationRequest::default()
        }
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let service = GenerationService::new(MockStorage::default());
        for bad in [request("", 10), request("customers", 0)] {
            let err = service.generate(bad).await.unwrap_err();
            assert_eq!(err.to_string(), "Validation error: Missing required fields");
        }

        let mut no_user = request("customers", 10);
        no_user.user_id.clear();
        assert!(service.generate(no_user).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_format_rejected() {
        let service = GenerationService::new(MockStorage::default());
        let mut req = request("customer_demographics", 10);
        req.format = "xlsx".to_string();
        assert!(matches!(
            service.generate(req).await.unwrap_err(),
            SynthError::InvalidConfigValueError { .. }
        ));
    }

    #[tokio::test]
    async fn test_heuristic_job_stores_data_and_record() {
        let storage = MockStorage::default();
        let service = GenerationService::new(storage.clone());
        let mut req = request("customers", 5);
        req.columns = vec!["customer_id".to_string(), "email".to_string()];

        let response = service.generate(req).await.unwrap();
        assert_eq!(response.status, JobStatus::Completed);
        assert_eq!(response.record_count, 5);
        assert_eq!(
            response.location,
            format!("synthetic-data/user-1/{}.csv", response.job_id)
        );
        assert!(response.preview.is_none());
        assert_eq!(response.metadata.model_used, ModelKind::Gan);

        let csv = String::from_utf8(storage.get_file(&response.location).await.unwrap()).unwrap();
        assert!(csv.starts_with("customer_id,email\nSYN_CUS_00000001,user000001@example.com\n"));

        let record = service.job_status(&response.job_id, "user-1").await.unwrap();
        assert_eq!(record.record_count, Some(5));
        assert_eq!(record.request.unwrap().source, SourceKind::Heuristic);
        let created = record.completed_at.unwrap();
        assert_eq!(record.expires_at.unwrap() - created, Duration::days(30));
    }

    #[tokio::test]
    async fn test_heuristic_requires_columns() {
        let service = GenerationService::new(MockStorage::default());
        let err = service.generate(request("customers", 5)).await.unwrap_err();
        assert!(err.to_string().contains("columns are required"));
    }

    #[tokio::test]
    async fn test_sample_job_with_json_preview() {
        let service = GenerationService::new(MockStorage::default());
        let mut req = request("iot_sensors", 25);
        req.format = "json".to_string();

        let response = service.generate(req).await.unwrap();
        assert!(response.location.ends_with(".json"));
        assert_eq!(response.metadata.model_used, ModelKind::Gan);
        let preview = response.preview.unwrap();
        assert_eq!(preview.len(), PREVIEW_SIZE);
        assert!(preview[0].data.contains_key("temperature"));

        let record = service.job_status(&response.job_id, "user-1").await.unwrap();
        assert_eq!(record.request.unwrap().source, SourceKind::Sample);
    }

    #[tokio::test]
    async fn test_source_data_job() {
        let storage = MockStorage::default();
        let service = GenerationService::new(storage.clone());
        let rows: Vec<Record> = (0..12)
            .map(|i| {
                let mut r = Record::new();
                r.insert("score", json!(10 + i));
                r.insert("tier", json!(if i % 2 == 0 { "gold" } else { "silver" }));
                r
            })
            .collect();
        let mut req = request("loyalty", 8);
        req.source_data = Some(rows);
        req.privacy = "high".to_string();
        req.format = "tsv".to_string();

        let response = service.generate(req).await.unwrap();
        assert_eq!(response.record_count, 8);
        assert_eq!(response.metadata.model_used, ModelKind::Diffusion);
        assert_eq!(response.metadata.privacy.level, PrivacyLevel::Maximum);
        assert_eq!(response.metadata.privacy.anonymization_level, "High");

        let tsv = String::from_utf8(storage.get_file(&response.location).await.unwrap()).unwrap();
        assert!(tsv.starts_with("score\ttier\n"));
    }

    #[tokio::test]
    async fn test_job_status_fallback_and_validation() {
        let service = GenerationService::new(MockStorage::default());
        let record = service.job_status("job-9", "user-1").await.unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.message.as_deref(), Some("job metadata not available"));

        let json: Value = serde_json::to_value(&record).unwrap();
        assert!(json.get("location").is_none());

        assert!(service.job_status("", "user-1").await.is_err());
        assert!(service.job_status("job-9", " ").await.is_err());
        assert!(service.job_status("../secrets", "user-1").await.is_err());
        assert!(service.job_status("job-9", "../../etc").await.is_err());
    }

    #[tokio::test]
    async fn test_path_like_user_id_rejected_before_writing() {
        let service = GenerationService::new(MockStorage::default());
        for user_id in ["../../escaped", "a/b", "..", "name\\dir"] {
            let mut req = request("customer_demographics", 5);
            req.user_id = user_id.to_string();
            let err = service.generate(req).await.unwrap_err();
            assert!(matches!(err, SynthError::InvalidConfigValueError { .. }));
        }
        assert!(service.storage().files.lock().await.is_empty());
    }

    #[test]
    fn test_health_report() {
        let service = GenerationService::new(MockStorage::default());
        let health = service.health();
        assert_eq!(health.status, "ok");
        assert_eq!(health.service, "synth-data");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert!(health.endpoints.contains_key("generate"));
    }
}
