use crate::analytics::DEFAULT_NO_DATA_LABEL;
use crate::error::{DashboardError, Result};
use crate::merge::MergePolicy;
use crate::schema::BranchFilter;
use crate::store::DEFAULT_STORAGE_KEY;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DashboardConfig {
    #[schemars(description = "Key under which the merged dataset is persisted")]
    pub storage_key: String,

    #[schemars(description = "Branches offered by the branch selector, in display order")]
    pub branches: Vec<String>,

    #[schemars(description = "Selector label meaning every branch")]
    pub all_branches_label: String,

    #[schemars(description = "Breakdown bucket name for records with an empty category or seller")]
    pub no_data_label: String,

    pub merge_policy: MergePolicy,

    #[schemars(
        description = "Field delimiter of uploaded files. When absent it is sniffed from the header line among ',', ';' and tab."
    )]
    pub delimiter: Option<char>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            branches: vec!["Buenavista".to_string(), "Masaryk".to_string()],
            all_branches_label: "Todas".to_string(),
            no_data_label: DEFAULT_NO_DATA_LABEL.to_string(),
            merge_policy: MergePolicy::default(),
            delimiter: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(DashboardError::InvalidConfig(
                "storage_key must not be empty".to_string(),
            ));
        }

        if self.branches.is_empty() {
            return Err(DashboardError::InvalidConfig(
                "at least one branch is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for branch in &self.branches {
            if branch.trim().is_empty() {
                return Err(DashboardError::InvalidConfig(
                    "branch names must not be empty".to_string(),
                ));
            }
            if !seen.insert(branch.trim().to_lowercase()) {
                return Err(DashboardError::InvalidConfig(format!(
                    "branch '{}' is listed more than once",
                    branch
                )));
            }
        }

        if seen.contains(&self.all_branches_label.trim().to_lowercase()) {
            return Err(DashboardError::InvalidConfig(format!(
                "all_branches_label '{}' collides with a branch name",
                self.all_branches_label
            )));
        }

        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
                return Err(DashboardError::InvalidConfig(format!(
                    "unsupported delimiter {:?}",
                    delimiter
                )));
            }
        }

        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects. Only meaningful after `validate`.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter
            .filter(char::is_ascii)
            .map(|c| c as u8)
    }

    /// Selector entries: the "all" label followed by every configured branch.
    pub fn branch_options(&self) -> Vec<String> {
        std::iter::once(self.all_branches_label.clone())
            .chain(self.branches.iter().cloned())
            .collect()
    }

    pub fn branch_filter(&self, label: &str) -> BranchFilter {
        BranchFilter::from_label(label, &self.all_branches_label)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&schemars::schema_for!(DashboardConfig))
    }
}
