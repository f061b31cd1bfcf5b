pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::pipelines::SynthPipeline;
pub use app::service::{GenerationRequest, GenerationResponse, GenerationService, JobRecord};
pub use config::cli::LocalStorage;
pub use config::toml_config::TomlConfig;
pub use config::CliJob;
#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use core::engine::SynthEngine;
pub use domain::model::{DataSource, Dataset, GenerationConfig, OutputFormat, Record};
pub use utils::error::{Result, SynthError};
