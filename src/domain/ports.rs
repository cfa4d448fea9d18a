use crate::config::cleaning::CleaningConfig;
use crate::domain::model::{OutputFormat, Record, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human readable location of `path`, used in logs and results.
    fn describe(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    /// Where the fetched raw JSON is kept, relative to the storage root.
    fn raw_file(&self) -> Option<&str>;
    /// When set, records are read from this file instead of the API.
    fn input_file(&self) -> Option<&str>;
    fn output_file(&self) -> &str;
    fn output_format(&self) -> OutputFormat;
    fn cleaning(&self) -> &CleaningConfig;
}

/// Column presence checks. Stages use this instead of assuming a column exists.
pub trait ColumnLookup {
    fn column_index(&self, name: &str) -> Option<usize>;

    fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
