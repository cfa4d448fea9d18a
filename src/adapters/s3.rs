use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Builds a client from the default AWS credential chain.
    pub async fn connect(bucket: &str, region: Option<&str>) -> Self {
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(region) = region {
            builder = builder.region(Region::new(region.to_string()));
        }
        let client = S3Client::from_conf(builder.build());
        Self::new(client, bucket.to_string())
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_no_such_key() {
                    return Err(EtlError::InputNotFound {
                        location: self.describe(path),
                    });
                }
                return Err(EtlError::StorageError {
                    message: format!(
                        "Failed to read {}: {}",
                        self.describe(path),
                        DisplayErrorContext(&service_error)
                    ),
                });
            }
        };

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| EtlError::StorageError {
                message: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| EtlError::StorageError {
                message: format!(
                    "Failed to write {}: {}",
                    self.describe(path),
                    DisplayErrorContext(&e)
                ),
            })?;

        tracing::debug!("Uploaded {} bytes to {}", data.len(), self.describe(path));
        Ok(())
    }

    fn describe(&self, path: &str) -> String {
        format!("s3://{}/{}", self.bucket, path)
    }
}
