//! Search configuration: field metadata and enabled search menus, loaded from JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Search configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    Missing(String),
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Storage type of a searchable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Date,
    Datetime,
    Char,
    Float,
    Integer,
}

impl FieldType {
    pub fn is_date(self) -> bool {
        matches!(self, FieldType::Date | FieldType::Datetime)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Float | FieldType::Integer)
    }
}

/// Metadata for one searchable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Human-readable label shown in facets
    #[serde(rename = "string")]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub sortable: bool,
    /// Filters sharing a group are OR-combined into one facet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl FieldDef {
    pub fn new(label: &str, field_type: FieldType) -> Self {
        Self {
            label: label.to_string(),
            field_type,
            sortable: false,
            group: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}

/// Search menus the host exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMenuType {
    Filter,
    Comparison,
}

/// How many comparisons may be active at once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// One comparison per date field
    #[default]
    PerField,
    /// Activating a comparison deactivates all others
    Exclusive,
}

fn default_menu_types() -> Vec<SearchMenuType> {
    vec![SearchMenuType::Filter]
}

/// Search configuration handed to a composer at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Table the query is compiled against
    pub model: String,
    #[serde(default = "default_menu_types")]
    pub search_menu_types: Vec<SearchMenuType>,
    #[serde(default)]
    pub comparison_mode: ComparisonMode,
    pub fields: BTreeMap<String, FieldDef>,
}

impl SearchConfig {
    /// Load a search configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let display = path_ref.display().to_string();

        if !path_ref.exists() {
            return Err(ConfigError::Missing(display));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: display,
            source,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn comparison_enabled(&self) -> bool {
        self.search_menu_types.contains(&SearchMenuType::Comparison)
    }

    /// Group key of a field; ungrouped fields form their own group
    pub fn group_of<'a>(&'a self, field: &'a str) -> &'a str {
        self.fields
            .get(field)
            .and_then(|def| def.group.as_deref())
            .unwrap_or(field)
    }

    /// Same configuration with only the filter menu enabled
    pub fn without_comparison(mut self) -> Self {
        self.search_menu_types
            .retain(|menu| *menu != SearchMenuType::Comparison);
        self
    }

    pub fn with_comparison_mode(mut self, mode: ComparisonMode) -> Self {
        self.comparison_mode = mode;
        self
    }

    /// Built-in partner search view (used for tests or as fallback)
    pub fn default() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "birthday".to_string(),
            FieldDef::new("Birthday", FieldType::Date).sortable().in_group("dates"),
        );
        fields.insert(
            "date_field".to_string(),
            FieldDef::new("Date", FieldType::Date).sortable().in_group("dates"),
        );
        fields.insert("float_field".to_string(), FieldDef::new("Float", FieldType::Float));
        fields.insert(
            "foo".to_string(),
            FieldDef::new("Foo", FieldType::Char).sortable(),
        );

        Self {
            model: "res_partner".to_string(),
            search_menu_types: vec![SearchMenuType::Filter, SearchMenuType::Comparison],
            comparison_mode: ComparisonMode::PerField,
            fields,
        }
    }
}
