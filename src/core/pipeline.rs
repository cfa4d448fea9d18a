use crate::adapters::DatasetClient;
use crate::core::serialize::serialize_table;
use crate::core::transform::{clean_records, parse_records};
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult};
use crate::utils::error::Result;

/// NYC 311 pipeline: API (or a previously fetched raw file) → cleaned table → storage.
pub struct ComplaintsPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: DatasetClient,
}

impl<S: Storage, C: ConfigProvider> ComplaintsPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let client = DatasetClient::new(config.timeout_seconds());
        Self {
            storage,
            config,
            client,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ComplaintsPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        if let Some(input) = self.config.input_file() {
            tracing::debug!("Reading raw records from {}", self.storage.describe(input));
            let bytes = self.storage.read_file(input).await?;
            return parse_records(&bytes);
        }

        let bytes = self.client.fetch(self.config.api_endpoint()).await?;
        let records = parse_records(&bytes)?;

        if let Some(raw_file) = self.config.raw_file() {
            self.storage.write_file(raw_file, &bytes).await?;
            tracing::debug!("Raw JSON kept at {}", self.storage.describe(raw_file));
        }

        Ok(records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        clean_records(data, self.config.cleaning())
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_file = self.config.output_file();
        let data = serialize_table(&result.table, self.config.output_format())?;

        tracing::debug!(
            "Writing {} ({} bytes) to storage",
            self.config.output_format().extension(),
            data.len()
        );
        self.storage.write_file(output_file, &data).await?;

        Ok(self.storage.describe(output_file))
    }
}
