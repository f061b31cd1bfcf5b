use crate::domain::model::{DataSource, Dataset, GenerationConfig, GenerationOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source(&self) -> &DataSource;
    fn output_path(&self) -> &str;
    fn generation(&self) -> &GenerationConfig;
    /// Zip archive name; `None` writes the bare data file.
    fn bundle_name(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Dataset>;
    async fn transform(&self, data: Dataset) -> Result<GenerationOutcome>;
    async fn load(&self, outcome: GenerationOutcome) -> Result<String>;
}
