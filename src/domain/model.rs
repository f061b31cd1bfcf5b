use crate::utils::error::{Result, SynthError};
use crate::utils::validation::{validate_percentage, validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Upper bound on records a single job may request.
pub const MAX_RECORD_COUNT: usize = 50_000_000;

static NULL: Value = Value::Null;

/// One row of a dataset. Keys keep insertion order so exports follow the source layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `column`, with missing keys reading as null.
    pub fn value(&self, column: &str) -> &Value {
        self.data.get(column).unwrap_or(&NULL)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.data.insert(column.into(), value);
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Builds a dataset whose columns are the union of record keys in first-seen order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.data.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records.iter().map(move |r| r.value(column))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Date,
    Boolean,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Email,
    Phone,
    Name,
    Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    pub standard_deviation: f64,
    pub min: f64,
    pub max: f64,
    pub quartiles: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<Pattern>>,
    pub sensitivity: Sensitivity,
}

impl ColumnProfile {
    pub fn has_pattern(&self, pattern: Pattern) -> bool {
        self.patterns
            .as_ref()
            .map(|p| p.contains(&pattern))
            .unwrap_or(false)
    }
}

pub type CorrelationMatrix = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetAnalysis {
    pub total_records: usize,
    pub total_columns: usize,
    pub columns: Vec<ColumnProfile>,
    pub null_percentage: f64,
    pub duplicate_percentage: f64,
    pub outlier_percentage: f64,
    pub bias_score: f64,
    pub privacy_score: f64,
    pub correlations: CorrelationMatrix,
    pub quality_score: f64,
}

impl DatasetAnalysis {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Tsv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Tsv => "tsv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
            Self::Tsv => "text/tab-separated-values",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "tsv" => Ok(Self::Tsv),
            other => Err(SynthError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Supported formats: csv, json, tsv".to_string(),
            }),
        }
    }
}

/// Descriptive only; every method runs the same statistical sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    #[default]
    Statistical,
    Ml,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasSettings {
    pub enabled: bool,
    pub target_bias: f64,
    pub sensitive_attributes: Vec<String>,
    pub fairness_constraints: Vec<String>,
}

impl Default for BiasSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            target_bias: 10.0,
            sensitive_attributes: Vec::new(),
            fairness_constraints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    pub outlier_percentage: f64,
    pub null_percentage: f64,
    pub duplicate_percentage: f64,
    pub consistency_score: f64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            outlier_percentage: 0.0,
            null_percentage: 0.0,
            duplicate_percentage: 0.0,
            consistency_score: 95.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    #[default]
    Basic,
    Enhanced,
    Maximum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferentialPrivacy {
    pub enabled: bool,
    pub epsilon: f64,
}

impl Default for DifferentialPrivacy {
    fn default() -> Self {
        Self {
            enabled: false,
            epsilon: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub level: PrivacyLevel,
    pub anonymize: bool,
    pub encrypt_sensitive: bool,
    pub k_anonymity: u32,
    pub differential_privacy: DifferentialPrivacy,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            level: PrivacyLevel::Basic,
            anonymize: false,
            encrypt_sensitive: false,
            k_anonymity: 5,
            differential_privacy: DifferentialPrivacy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub record_count: usize,
    pub format: OutputFormat,
    /// Empty selects every analysed column.
    pub selected_columns: Vec<String>,
    pub method: GenerationMethod,
    pub seed: Option<u64>,
    pub bias: BiasSettings,
    pub quality: QualitySettings,
    pub privacy: PrivacySettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            record_count: 1000,
            format: OutputFormat::Csv,
            selected_columns: Vec::new(),
            method: GenerationMethod::Statistical,
            seed: None,
            bias: BiasSettings::default(),
            quality: QualitySettings::default(),
            privacy: PrivacySettings::default(),
        }
    }
}

impl Validate for GenerationConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("generation.record_count", self.record_count, 1)?;
        validate_range(
            "generation.record_count",
            self.record_count,
            1,
            MAX_RECORD_COUNT,
        )?;
        validate_percentage("quality.outlier_percentage", self.quality.outlier_percentage)?;
        validate_percentage("quality.null_percentage", self.quality.null_percentage)?;
        validate_percentage(
            "quality.duplicate_percentage",
            self.quality.duplicate_percentage,
        )?;
        validate_percentage("quality.consistency_score", self.quality.consistency_score)?;
        validate_percentage("bias.target_bias", self.bias.target_bias)?;
        validate_positive_number(
            "privacy.k_anonymity",
            self.privacy.k_anonymity as usize,
            1,
        )?;

        let epsilon = self.privacy.differential_privacy.epsilon;
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(SynthError::InvalidConfigValueError {
                field: "privacy.differential_privacy.epsilon".to_string(),
                value: epsilon.to_string(),
                reason: "Epsilon must be a positive number".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub record_count: usize,
    pub completeness: f64,
    pub consistency: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyMetrics {
    pub anonymization_level: String,
    pub level: PrivacyLevel,
    pub k_anonymity: u32,
    pub differential_privacy: bool,
    pub privacy_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasMetrics {
    pub overall_bias: f64,
    pub fairness_score: f64,
    pub target_bias: f64,
    pub sensitive_attribute_balance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub generation_time_ms: u64,
    pub seed: u64,
    pub method: GenerationMethod,
    pub quality: QualityMetrics,
    pub privacy: PrivacyMetrics,
    pub bias: BiasMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticDataResult {
    pub data: Dataset,
    pub metadata: GenerationMetadata,
}

/// Where a job's source dataset comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataSource {
    /// Path relative to the storage root; the extension picks the parser.
    File { path: String },
    Url { url: String },
    Sample { id: String, records: usize },
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => write!(f, "file:{}", path),
            Self::Url { url } => write!(f, "{}", url),
            Self::Sample { id, records } => write!(f, "sample:{} ({} records)", id, records),
        }
    }
}

/// Output of the transform phase: what was learned from the source and what was generated.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub analysis: DatasetAnalysis,
    pub result: SyntheticDataResult,
}
