//! Stage entry points for an external workflow driver. Each one runs to
//! completion or returns the error that stopped it; nothing is retried.

use crate::adapters::{read_location, write_location, DatasetClient, Location};
use crate::config::cleaning::CleaningConfig;
use crate::core::serialize::serialize_table;
use crate::core::transform::{clean_records, parse_records};
use crate::domain::model::{CleanReport, OutputFormat};
use crate::utils::error::Result;

/// Downloads the dataset and stores the raw JSON. Returns the record count.
pub async fn fetch_raw(endpoint: &str, raw_location: &str, timeout_seconds: u64) -> Result<usize> {
    let destination = Location::parse(raw_location)?;
    tracing::info!("📥 Fetching dataset from {}", endpoint);

    let body = DatasetClient::new(timeout_seconds).fetch(endpoint).await?;
    // 先確認是合法的紀錄陣列再落地
    let count = parse_records(&body)?.len();

    write_location(&destination, &body).await?;
    tracing::info!("💾 Saved {} raw records to {}", count, destination);
    Ok(count)
}

/// Reads raw JSON from `input`, cleans it and writes the table to `output`.
pub async fn transform_location(
    input: &str,
    output: &str,
    format: OutputFormat,
    cleaning: &CleaningConfig,
) -> Result<CleanReport> {
    let source = Location::parse(input)?;
    let destination = Location::parse(output)?;

    tracing::info!("🔄 Transforming {} -> {}", source, destination);
    let bytes = read_location(&source).await?;
    let records = parse_records(&bytes)?;
    let result = clean_records(records, cleaning)?;

    let data = serialize_table(&result.table, format)?;
    write_location(&destination, &data).await?;

    tracing::info!(
        "✅ Wrote {} rows x {} columns to {}",
        result.report.output_rows,
        result.report.output_columns.len(),
        destination
    );
    Ok(result.report)
}

/// Copies a local file to `s3://{bucket}/{key}`.
#[cfg(feature = "s3")]
pub async fn upload_file(local_file: &str, bucket: &str, key: &str, region: Option<&str>) -> Result<()> {
    use crate::adapters::{LocalStorage, S3Storage};
    use crate::domain::ports::Storage;

    let data = LocalStorage::new(String::new()).read_file(local_file).await?;
    let storage = S3Storage::connect(bucket, region).await;
    storage.write_file(key, &data).await?;

    tracing::info!("☁️ Uploaded {} to {}", local_file, storage.describe(key));
    Ok(())
}
