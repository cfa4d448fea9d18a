// 外部系統的具體實作：本機檔案、S3、HTTP

pub mod http;
pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::fmt;
use std::path::PathBuf;
use url::Url;

pub use http::DatasetClient;
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Where a stage reads from or writes to: a local path or `s3://bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    S3 { bucket: String, key: String },
}

impl Location {
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.starts_with("s3://") {
            if raw.trim().is_empty() {
                return Err(EtlError::InvalidConfigValueError {
                    field: "location".to_string(),
                    value: raw.to_string(),
                    reason: "Location cannot be empty".to_string(),
                });
            }
            return Ok(Location::Local(PathBuf::from(raw)));
        }

        let url = Url::parse(raw).map_err(|e| EtlError::InvalidConfigValueError {
            field: "location".to_string(),
            value: raw.to_string(),
            reason: format!("Invalid S3 URI: {}", e),
        })?;
        let bucket = url.host_str().unwrap_or_default().to_string();
        let key = url.path().trim_start_matches('/').to_string();
        if bucket.is_empty() || key.is_empty() {
            return Err(EtlError::InvalidConfigValueError {
                field: "location".to_string(),
                value: raw.to_string(),
                reason: "S3 URI must look like s3://bucket/key".to_string(),
            });
        }

        Ok(Location::S3 { bucket, key })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::S3 { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
        }
    }
}

pub async fn read_location(location: &Location) -> Result<Vec<u8>> {
    match location {
        Location::Local(path) => {
            LocalStorage::new(String::new())
                .read_file(&path.to_string_lossy())
                .await
        }
        #[cfg(feature = "s3")]
        Location::S3 { bucket, key } => S3Storage::connect(bucket, None).await.read_file(key).await,
        #[cfg(not(feature = "s3"))]
        Location::S3 { .. } => Err(s3_disabled(location)),
    }
}

pub async fn write_location(location: &Location, data: &[u8]) -> Result<()> {
    match location {
        Location::Local(path) => {
            LocalStorage::new(String::new())
                .write_file(&path.to_string_lossy(), data)
                .await
        }
        #[cfg(feature = "s3")]
        Location::S3 { bucket, key } => {
            S3Storage::connect(bucket, None)
                .await
                .write_file(key, data)
                .await
        }
        #[cfg(not(feature = "s3"))]
        Location::S3 { .. } => Err(s3_disabled(location)),
    }
}

#[cfg(not(feature = "s3"))]
fn s3_disabled(location: &Location) -> EtlError {
    EtlError::ConfigError {
        message: format!("{} requires the `s3` feature", location),
    }
}
