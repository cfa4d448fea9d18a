pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{LocalStorage, Location};
#[cfg(feature = "s3")]
pub use adapters::S3Storage;

pub use config::{CleaningConfig, TomlConfig};
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::etl::{EtlEngine, EtlOutcome};
pub use core::pipeline::ComplaintsPipeline;
pub use core::stages::{fetch_raw, transform_location};
#[cfg(feature = "s3")]
pub use core::stages::upload_file;
pub use core::transform::{clean_records, parse_records};

pub use domain::model::{CleanReport, OutputFormat, Record, Table, Value};
pub use utils::error::{EtlError, Result};
