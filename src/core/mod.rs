pub mod analysis;
pub mod engine;
pub mod export;
pub mod generator;
pub mod heuristic;
pub mod parser;
pub mod patterns;
pub mod router;
pub mod samples;
pub mod stats;
pub mod values;

pub use crate::app::pipelines::SynthPipeline;
pub use crate::domain::model::{Dataset, Record};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
