use crate::adapters::http::NYC311_ENDPOINT;
use crate::config::cleaning::CleaningConfig;
use crate::core::ConfigProvider;
use crate::domain::model::OutputFormat;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_file_extension, validate_non_empty_string, validate_path,
    validate_positive_number, validate_s3_bucket_name, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub upload: Option<UploadConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    NYC311_ENDPOINT.to_string()
}

fn default_timeout() -> u64 {
    60
}

/// `[transform]`：使用內建規則（可選 borough），或在 `[transform.cleaning]` 完整覆寫
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub include_borough: bool,
    pub cleaning: Option<CleaningConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_file: String,
    pub format: Option<OutputFormat>,
    pub raw_file: Option<String>,
    pub input_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub bucket: String,
    pub key: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    #[serde(default)]
    pub json_logs: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NYC311_BUCKET})；未設定的變數原樣保留
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!("Environment variable {} is not set", var_name);
                format!("${{{}}}", var_name)
            })
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validate_url("source.endpoint", &self.source.endpoint)?;
        validate_positive_number("source.timeout_seconds", self.source.timeout_seconds, 1)?;

        validate_path("load.output_path", &self.load.output_path)?;
        if self.load.format.is_none() {
            validate_file_extension("load.output_file", &self.load.output_file, &["csv", "parquet"])?;
        } else {
            validate_path("load.output_file", &self.load.output_file)?;
        }
        if let Some(raw_file) = &self.load.raw_file {
            validate_path("load.raw_file", raw_file)?;
        }
        if let Some(input_file) = &self.load.input_file {
            validate_path("load.input_file", input_file)?;
        }

        self.cleaning().validate()?;

        if let Some(upload) = &self.upload {
            validate_s3_bucket_name("upload.bucket", &upload.bucket)?;
            validate_non_empty_string("upload.key", &upload.key)?;
            if let Some(region) = &upload.region {
                validate_aws_region("upload.region", region)?;
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.json_logs).unwrap_or(false)
    }

    /// Local path of the cleaned output, for the upload step.
    pub fn output_location(&self) -> String {
        Path::new(&self.load.output_path)
            .join(&self.load.output_file)
            .display()
            .to_string()
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds
    }

    fn raw_file(&self) -> Option<&str> {
        self.load.raw_file.as_deref()
    }

    fn input_file(&self) -> Option<&str> {
        self.load.input_file.as_deref()
    }

    fn output_file(&self) -> &str {
        &self.load.output_file
    }

    fn output_format(&self) -> OutputFormat {
        self.load
            .format
            .unwrap_or_else(|| OutputFormat::from_path(&self.load.output_file))
    }

    fn cleaning(&self) -> &CleaningConfig {
        match &self.transform.cleaning {
            Some(cleaning) => cleaning,
            None => CleaningConfig::preset(self.transform.include_borough),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
