use crate::domain::model::ColumnRole;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_unique_names, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static NYC311: LazyLock<CleaningConfig> = LazyLock::new(CleaningConfig::nyc311);
static NYC311_WITH_BOROUGH: LazyLock<CleaningConfig> =
    LazyLock::new(CleaningConfig::nyc311_with_borough);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    pub role: ColumnRole,
}

impl OutputColumn {
    pub fn new(name: &str, role: ColumnRole) -> Self {
        Self {
            name: name.to_string(),
            role,
        }
    }
}

/// 清理規則：輸出欄位白名單、預設值、數值欄位
///
/// 每個清理階段都從這裡讀取設定，「有沒有 borough」只是兩組不同的設定，
/// 不需要分叉程式碼。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Ordered whitelist of output columns.
    pub output_columns: Vec<OutputColumn>,
    /// Value written into null cells of each listed column.
    pub fill_defaults: BTreeMap<String, String>,
    /// Columns parsed as numbers when present.
    pub numeric_columns: Vec<String>,
    /// Any column whose name contains this marker is parsed as date/time.
    pub date_marker: String,
}

impl CleaningConfig {
    /// NYC 311 rules without `borough`.
    pub fn nyc311() -> Self {
        use ColumnRole::*;

        let output_columns = vec![
            OutputColumn::new("unique_key", Identifier),
            OutputColumn::new("status", Categorical),
            OutputColumn::new("created_date", Temporal),
            OutputColumn::new("closed_date", Temporal),
            OutputColumn::new("agency", Categorical),
            OutputColumn::new("complaint_type", Categorical),
            OutputColumn::new("descriptor", Categorical),
            OutputColumn::new("incident_zip", Numeric),
            OutputColumn::new("incident_address", FreeText),
            OutputColumn::new("latitude", Numeric),
            OutputColumn::new("longitude", Numeric),
            OutputColumn::new("resolution_description", FreeText),
        ];

        let fill_defaults = [
            ("agency", "Unknown"),
            ("complaint_type", "Not Specified"),
            ("descriptor", "Not Specified"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            output_columns,
            fill_defaults,
            numeric_columns: ["latitude", "longitude", "community_board", "incident_zip"]
                .into_iter()
                .map(String::from)
                .collect(),
            date_marker: "date".to_string(),
        }
    }

    /// NYC 311 rules that also keep `borough` (defaulting to `Unknown`).
    pub fn nyc311_with_borough() -> Self {
        let mut config = Self::nyc311();
        let position = config
            .output_columns
            .iter()
            .position(|c| c.name == "incident_address")
            .map(|i| i + 1)
            .unwrap_or(config.output_columns.len());
        config
            .output_columns
            .insert(position, OutputColumn::new("borough", ColumnRole::Categorical));
        config
            .fill_defaults
            .insert("borough".to_string(), "Unknown".to_string());
        config
    }

    /// Shared instance of one of the two NYC 311 presets.
    pub fn preset(include_borough: bool) -> &'static CleaningConfig {
        if include_borough {
            &*NYC311_WITH_BOROUGH
        } else {
            &*NYC311
        }
    }

    pub fn output_column_names(&self) -> impl Iterator<Item = &str> {
        self.output_columns.iter().map(|c| c.name.as_str())
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self::nyc311()
    }
}

impl Validate for CleaningConfig {
    fn validate(&self) -> Result<()> {
        validate_unique_names("transform.output_columns", self.output_column_names())?;
        validate_unique_names(
            "transform.numeric_columns",
            self.numeric_columns.iter().map(String::as_str),
        )?;
        validate_non_empty_string("transform.date_marker", &self.date_marker)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borough_variant_inserts_after_address() {
        let config = CleaningConfig::nyc311_with_borough();
        let names: Vec<&str> = config.output_column_names().collect();
        let address = names.iter().position(|n| *n == "incident_address").unwrap();
        assert_eq!(names[address + 1], "borough");
        assert_eq!(names.len(), 13);
        assert_eq!(config.fill_defaults.get("borough").map(String::as_str), Some("Unknown"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_has_no_borough() {
        let config = CleaningConfig::default();
        assert!(!config.output_column_names().any(|n| n == "borough"));
        assert_eq!(config.fill_defaults.len(), 3);
        assert_eq!(config.date_marker, "date");
    }

    #[test]
    fn test_duplicate_output_columns_rejected() {
        let mut config = CleaningConfig::nyc311();
        config
            .output_columns
            .push(OutputColumn::new("status", ColumnRole::Categorical));
        assert!(config.validate().is_err());
    }
}
