use crate::config::validate_source;
use crate::domain::model::{DataSource, GenerationConfig};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SynthError};
use crate::utils::validation::{validate_file_extension, validate_non_empty_string, validate_path, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

/// A generation job described in a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub job: JobConfig,
    pub source: DataSource,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    /// Zip archive name. Without it only the data file is written.
    pub bundle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| SynthError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Crate log level from `[monitoring] log_level`, if set.
    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref()?.log_level.as_deref()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().is_some_and(|m| m.enabled)
    }
}

impl ConfigProvider for TomlConfig {
    fn source(&self) -> &DataSource {
        &self.source
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    fn bundle_name(&self) -> Option<&str> {
        self.output.bundle.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("job.name", &self.job.name)?;
        validate_source(&self.source)?;
        validate_path("output.path", &self.output.path)?;
        if let Some(bundle) = &self.output.bundle {
            validate_file_extension("output.bundle", bundle, &["zip"])?;
        }
        self.generation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{OutputFormat, PrivacyLevel};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[job]
name = "customers"
description = "Synthetic customers"
version = "1.0.0"

[source]
type = "sample"
id = "customer_demographics"
records = 500

[generation]
record_count = 200
format = "json"
seed = 42
selected_columns = ["age", "income"]

[generation.quality]
null_percentage = 5.0

[generation.privacy]
level = "enhanced"
anonymize = true

[output]
path = "./out"
bundle = "customers.zip"

[monitoring]
enabled = true
log_level = "warn"
"#;

    #[test]
    fn test_parse_job_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.job.name, "customers");
        assert_eq!(
            config.source,
            DataSource::Sample {
                id: "customer_demographics".to_string(),
                records: 500
            }
        );
        assert_eq!(config.generation.record_count, 200);
        assert_eq!(config.generation.format, OutputFormat::Json);
        assert_eq!(config.generation.seed, Some(42));
        assert_eq!(config.generation.quality.null_percentage, 5.0);
        // Unset nested fields keep their defaults.
        assert_eq!(config.generation.quality.consistency_score, 95.0);
        assert_eq!(config.generation.privacy.level, PrivacyLevel::Enhanced);
        assert_eq!(config.generation.privacy.k_anonymity, 5);
        assert_eq!(config.bundle_name(), Some("customers.zip"));
        assert!(config.monitoring_enabled());
        assert_eq!(config.log_level(), Some("warn"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generation_section_is_optional() {
        let toml_content = r#"
[job]
name = "minimal"

[source]
type = "file"
path = "data/people.csv"

[output]
path = "./out"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.generation, GenerationConfig::default());
        assert_eq!(config.bundle_name(), None);
        assert!(!config.monitoring_enabled());
        assert_eq!(config.log_level(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SYNTH_TEST_SOURCE_URL", "https://data.example.com/rows.json");

        let toml_content = r#"
[job]
name = "remote"

[source]
type = "url"
url = "${SYNTH_TEST_SOURCE_URL}"

[output]
path = "${SYNTH_TEST_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.source,
            DataSource::Url {
                url: "https://data.example.com/rows.json".to_string()
            }
        );
        assert_eq!(config.output.path, "${SYNTH_TEST_UNSET_VAR}");

        std::env::remove_var("SYNTH_TEST_SOURCE_URL");
    }

    #[test]
    fn test_config_validation() {
        let bad_url = BASIC.replace(
            "type = \"sample\"\nid = \"customer_demographics\"\nrecords = 500",
            "type = \"url\"\nurl = \"invalid-url\"",
        );
        let config = TomlConfig::from_toml_str(&bad_url).unwrap();
        assert!(config.validate().is_err());

        let bad_percentage = BASIC.replace("null_percentage = 5.0", "null_percentage = 150.0");
        let config = TomlConfig::from_toml_str(&bad_percentage).unwrap();
        assert!(config.validate().is_err());

        let bad_bundle = BASIC.replace("customers.zip", "customers.tar");
        let config = TomlConfig::from_toml_str(&bad_bundle).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_reports_parse_error() {
        let err = TomlConfig::from_toml_str("[job\nname=").unwrap_err();
        assert!(matches!(err, SynthError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.job.name, "customers");
    }
}
