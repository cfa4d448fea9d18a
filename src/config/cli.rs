use crate::adapters::http::NYC311_ENDPOINT;
use crate::config::cleaning::CleaningConfig;
use crate::core::ConfigProvider;
use crate::domain::model::OutputFormat;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_file_extension, validate_path, validate_positive_number,
    validate_s3_bucket_name, validate_url, Validate,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nyc311-etl")]
#[command(about = "Fetch, flatten, clean and publish the NYC 311 service request dataset")]
pub struct Cli {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download the raw dataset and store it as JSON
    Fetch(FetchArgs),
    /// Clean a raw JSON file into CSV or Parquet
    Transform(TransformArgs),
    /// Copy a local file to S3 (requires the `s3` feature)
    Upload(UploadArgs),
    /// Fetch, transform and load in one go
    Run(CliConfig),
}

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    #[arg(long, default_value = NYC311_ENDPOINT)]
    pub endpoint: String,

    #[arg(long, default_value = "data/raw/nyc311.json", help = "Local path or s3://bucket/key")]
    pub raw: String,

    #[arg(long, default_value = "60")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Args)]
pub struct TransformArgs {
    #[arg(long, default_value = "data/raw/nyc311.json")]
    pub input: String,

    #[arg(long, default_value = "data/cleaned/nyc311.csv")]
    pub output: String,

    #[arg(long, help = "csv or parquet; defaults to the output extension")]
    pub format: Option<OutputFormat>,

    #[arg(long, help = "Keep the borough column")]
    pub include_borough: bool,
}

impl TransformArgs {
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output))
    }

    pub fn cleaning(&self) -> &CleaningConfig {
        CleaningConfig::preset(self.include_borough)
    }
}

#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    #[arg(long)]
    pub file: String,

    #[arg(long)]
    pub bucket: String,

    #[arg(long)]
    pub key: String,

    #[arg(long)]
    pub region: Option<String>,
}

/// Options of the `run` command. Either flags or a TOML file via `--config`.
#[derive(Debug, Clone, Args)]
pub struct CliConfig {
    #[arg(long, help = "Load all settings from a TOML file")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = NYC311_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, default_value = "60")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "./data")]
    pub output_path: String,

    #[arg(long, default_value = "raw/nyc311.json", help = "Raw JSON copy, relative to --output-path")]
    pub raw_file: Option<String>,

    #[arg(long, conflicts_with = "raw_file", help = "Do not keep a raw JSON copy")]
    pub no_raw_file: bool,

    #[arg(long, help = "Read this raw JSON file instead of calling the API")]
    pub input_file: Option<String>,

    #[arg(long, default_value = "cleaned/nyc311.csv")]
    pub output_file: String,

    #[arg(long)]
    pub format: Option<OutputFormat>,

    #[arg(long)]
    pub include_borough: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn raw_file(&self) -> Option<&str> {
        if self.no_raw_file {
            return None;
        }
        self.raw_file.as_deref()
    }

    fn input_file(&self) -> Option<&str> {
        self.input_file.as_deref()
    }

    fn output_file(&self) -> &str {
        &self.output_file
    }

    fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output_file))
    }

    fn cleaning(&self) -> &CleaningConfig {
        CleaningConfig::preset(self.include_borough)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_endpoint", &self.api_endpoint)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validate_path("output_path", &self.output_path)?;
        validate_file_extension("output_file", &self.output_file, &["csv", "parquet"])?;
        if let Some(raw_file) = self.raw_file() {
            validate_path("raw_file", raw_file)?;
        }
        if let Some(input_file) = &self.input_file {
            validate_path("input_file", input_file)?;
        }
        Ok(())
    }
}

impl Validate for FetchArgs {
    fn validate(&self) -> Result<()> {
        validate_url("endpoint", &self.endpoint)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validate_path("raw", &self.raw)
    }
}

impl Validate for TransformArgs {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_path("output", &self.output)?;
        if self.format.is_none() {
            validate_file_extension("output", &self.output, &["csv", "parquet"])?;
        }
        Ok(())
    }
}

impl Validate for UploadArgs {
    fn validate(&self) -> Result<()> {
        validate_path("file", &self.file)?;
        validate_s3_bucket_name("bucket", &self.bucket)?;
        if self.key.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "key".to_string(),
            });
        }
        if let Some(region) = &self.region {
            validate_aws_region("region", region)?;
        }
        Ok(())
    }
}
