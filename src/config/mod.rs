pub mod cli;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod toml_config;

use crate::core::samples;
use crate::domain::model::{DataSource, GenerationConfig, PrivacyLevel};
#[cfg(feature = "cli")]
use crate::domain::model::{OutputFormat, QualitySettings};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SynthError};
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_url, Validate, SUPPORTED_INPUT_EXTENSIONS,
};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "synth-data")]
#[command(version, about = "Analyse datasets and generate statistically similar synthetic data")]
pub struct CliConfig {
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Profile a csv, json, txt or docx file
    Analyze {
        input: String,

        #[arg(long, help = "Print the full analysis as JSON")]
        json: bool,
    },
    /// Generate synthetic records from a file, URL or sample dataset
    Generate(GenerateArgs),
    /// List the built-in sample datasets
    Samples,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[arg(long, conflicts_with_all = ["url", "sample"])]
    pub input: Option<String>,

    #[arg(long, conflicts_with = "sample")]
    pub url: Option<String>,

    #[arg(long, help = "Sample dataset id used as the source")]
    pub sample: Option<String>,

    #[arg(long, default_value = "1000", help = "Rows drawn from the sample dataset")]
    pub sample_rows: usize,

    #[arg(short = 'n', long, default_value = "1000")]
    pub records: usize,

    #[arg(short, long, default_value = "csv")]
    pub format: String,

    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = "0")]
    pub null_percentage: f64,

    #[arg(long, default_value = "0")]
    pub outlier_percentage: f64,

    #[arg(long, default_value = "0")]
    pub duplicate_percentage: f64,

    #[arg(long, default_value = "basic", help = "basic, enhanced or maximum")]
    pub privacy: String,

    #[arg(long, help = "Hash high-sensitivity columns")]
    pub anonymize: bool,

    #[arg(long, help = "Write a zip bundle with analysis and metadata")]
    pub bundle: Option<String>,

    #[arg(short, long, default_value = "./output")]
    pub output_path: String,
}

#[cfg(feature = "cli")]
impl GenerateArgs {
    pub fn into_job(self) -> Result<CliJob> {
        let source = match (self.input, self.url, self.sample) {
            (Some(path), None, None) => absolute_source(DataSource::File { path })?,
            (None, Some(url), None) => DataSource::Url { url },
            (None, None, Some(id)) => DataSource::Sample {
                id,
                records: self.sample_rows,
            },
            _ => {
                return Err(SynthError::MissingConfigError {
                    field: "exactly one of --input, --url or --sample".to_string(),
                })
            }
        };

        let mut generation = GenerationConfig {
            record_count: self.records,
            format: self.format.parse::<OutputFormat>()?,
            selected_columns: self.columns,
            seed: self.seed,
            quality: QualitySettings {
                null_percentage: self.null_percentage,
                outlier_percentage: self.outlier_percentage,
                duplicate_percentage: self.duplicate_percentage,
                ..QualitySettings::default()
            },
            ..GenerationConfig::default()
        };
        generation.privacy.level = parse_privacy_level(&self.privacy)?;
        generation.privacy.anonymize = self.anonymize;
        generation.privacy.encrypt_sensitive = self.anonymize;

        Ok(CliJob {
            source,
            output_path: self.output_path,
            generation,
            bundle: self.bundle,
        })
    }
}

/// A resolved `generate` invocation.
#[derive(Debug, Clone)]
pub struct CliJob {
    pub source: DataSource,
    pub output_path: String,
    pub generation: GenerationConfig,
    pub bundle: Option<String>,
}

impl ConfigProvider for CliJob {
    fn source(&self) -> &DataSource {
        &self.source
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    fn bundle_name(&self) -> Option<&str> {
        self.bundle.as_deref()
    }
}

impl Validate for CliJob {
    fn validate(&self) -> Result<()> {
        validate_path("output_path", &self.output_path)?;
        validate_source(&self.source)?;
        if let Some(bundle) = &self.bundle {
            validate_file_extension("bundle", bundle, &["zip"])?;
        }
        self.generation.validate()
    }
}

pub fn validate_source(source: &DataSource) -> Result<()> {
    match source {
        DataSource::File { path } => {
            validate_path("source.path", path)?;
            validate_file_extension("source.path", path, SUPPORTED_INPUT_EXTENSIONS)
        }
        DataSource::Url { url } => validate_url("source.url", url),
        DataSource::Sample { id, records } => {
            if samples::find_sample(id).is_none() {
                return Err(SynthError::InvalidConfigValueError {
                    field: "source.id".to_string(),
                    value: id.clone(),
                    reason: format!(
                        "Unknown sample dataset. Available: {}",
                        samples::SAMPLE_DATASETS
                            .iter()
                            .map(|d| d.id)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                });
            }
            crate::utils::validation::validate_positive_number("source.records", *records, 1)
        }
    }
}

/// File sources are read through storage rooted at the output directory, so
/// relative paths are anchored to the working directory first.
pub fn absolute_source(source: DataSource) -> Result<DataSource> {
    match source {
        DataSource::File { path } => {
            let absolute = std::path::absolute(&path)?;
            Ok(DataSource::File {
                path: absolute.to_string_lossy().into_owned(),
            })
        }
        other => Ok(other),
    }
}

pub fn parse_privacy_level(raw: &str) -> Result<PrivacyLevel> {
    match raw.trim().to_lowercase().as_str() {
        "basic" => Ok(PrivacyLevel::Basic),
        "enhanced" => Ok(PrivacyLevel::Enhanced),
        "maximum" => Ok(PrivacyLevel::Maximum),
        other => Err(SynthError::InvalidConfigValueError {
            field: "privacy".to_string(),
            value: other.to_string(),
            reason: "Supported levels: basic, enhanced, maximum".to_string(),
        }),
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut full = vec!["synth-data"];
        full.extend_from_slice(args);
        CliConfig::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_generate_from_sample() {
        let config = parse(&[
            "generate", "--sample", "iot_sensors", "-n", "50", "--format", "json", "--seed", "3",
            "--bundle", "out.zip", "-v",
        ]);
        assert!(config.verbose);
        let Command::Generate(args) = config.command else {
            panic!("expected generate");
        };
        let job = args.into_job().unwrap();

        assert_eq!(
            job.source,
            DataSource::Sample {
                id: "iot_sensors".to_string(),
                records: 1000
            }
        );
        assert_eq!(job.generation.record_count, 50);
        assert_eq!(job.generation.format, OutputFormat::Json);
        assert_eq!(job.bundle_name(), Some("out.zip"));
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_input_is_made_absolute() {
        let config = parse(&["generate", "--input", "data/people.csv"]);
        let Command::Generate(args) = config.command else {
            panic!("expected generate");
        };
        let job = args.into_job().unwrap();
        match &job.source {
            DataSource::File { path } => {
                assert!(std::path::Path::new(path).is_absolute());
                assert!(path.ends_with("people.csv"));
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_sources_rejected() {
        let result = CliConfig::try_parse_from([
            "synth-data", "generate", "--input", "a.csv", "--sample", "iot_sensors",
        ]);
        assert!(result.is_err());

        let config = parse(&["generate"]);
        let Command::Generate(args) = config.command else {
            panic!("expected generate");
        };
        assert!(matches!(
            args.into_job().unwrap_err(),
            SynthError::MissingConfigError { .. }
        ));
    }

    #[test]
    fn test_validation_catches_bad_values() {
        let config = parse(&["generate", "--sample", "weather"]);
        let Command::Generate(args) = config.command else {
            panic!("expected generate");
        };
        assert!(args.into_job().unwrap().validate().is_err());

        let config = parse(&["generate", "--input", "notes.pdf"]);
        let Command::Generate(args) = config.command else {
            panic!("expected generate");
        };
        assert!(args.into_job().unwrap().validate().is_err());

        let config = parse(&["generate", "--sample", "iot_sensors", "--privacy", "ultra"]);
        let Command::Generate(args) = config.command else {
            panic!("expected generate");
        };
        assert!(args.into_job().is_err());
    }

    #[test]
    fn test_samples_subcommand() {
        assert!(matches!(parse(&["samples"]).command, Command::Samples));
        assert!(matches!(
            parse(&["analyze", "x.csv", "--json"]).command,
            Command::Analyze { json: true, .. }
        ));
    }
}
