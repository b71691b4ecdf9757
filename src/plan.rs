//! YAML reshape plans.
//!
//! A plan captures everything a `widen` run needs so it can be versioned next
//! to the data:
//!
//! ```yaml
//! key: customer_id
//! fields: [phone, email]
//! limit: 3
//! null_values: ["NA", "N/A"]
//! cleaners:
//!   - kind: nullify_non_alphanumeric
//!     fields: [phone]
//!   - kind: blacklist
//!     values: [BILL_TO, SHIP_TO]
//!   - kind: concat
//!     target: full_name
//!     fields: [first_name, last_name]
//!   - kind: normalize_phone
//!     field: phone
//!     region: CA
//!     region_field: country
//! ```
//!
//! Command-line flags override the corresponding plan entries.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    error::ReshapeError,
    transform::{
        ColumnCleaner,
        cleaning::{Blacklist, NullifyNonAlphanumeric, NullifyPattern},
        concat::Concat,
        phone::NormalizePhone,
    },
    widen::DEFAULT_LIMIT,
};

fn default_separator() -> String {
    " ".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CleanerSpec {
    NullifyNonAlphanumeric {
        #[serde(default)]
        fields: Vec<String>,
    },
    NullifyPattern {
        pattern: String,
        #[serde(default)]
        fields: Vec<String>,
    },
    Blacklist {
        values: Vec<String>,
        #[serde(default)]
        fields: Vec<String>,
    },
    Concat {
        target: String,
        fields: Vec<String>,
        #[serde(default = "default_separator")]
        separator: String,
        #[serde(default)]
        null_substitute: String,
    },
    NormalizePhone {
        field: String,
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        region: Option<String>,
        #[serde(default)]
        region_field: Option<String>,
        #[serde(default)]
        use_original_on_error: bool,
    },
}

impl CleanerSpec {
    pub fn build(&self) -> std::result::Result<Box<dyn ColumnCleaner>, ReshapeError> {
        let cleaner: Box<dyn ColumnCleaner> = match self {
            CleanerSpec::NullifyNonAlphanumeric { fields } => {
                Box::new(NullifyNonAlphanumeric::new(fields.clone()))
            }
            CleanerSpec::NullifyPattern { pattern, fields } => {
                Box::new(NullifyPattern::new(pattern, fields.clone())?)
            }
            CleanerSpec::Blacklist { values, fields } => {
                Box::new(Blacklist::new(values.iter().cloned(), fields.clone()))
            }
            CleanerSpec::Concat {
                target,
                fields,
                separator,
                null_substitute,
            } => Box::new(
                Concat::new(target, fields.clone())
                    .with_separator(separator)
                    .with_null_substitute(null_substitute),
            ),
            CleanerSpec::NormalizePhone {
                field,
                key,
                target,
                region,
                region_field,
                use_original_on_error,
            } => {
                let mut phone =
                    NormalizePhone::new(field).use_original_on_error(*use_original_on_error);
                if let Some(key) = key {
                    phone = phone.with_key(key);
                }
                if let Some(target) = target {
                    phone = phone.with_target(target);
                }
                if let Some(region) = region {
                    phone = phone.with_region(region);
                }
                if let Some(region_field) = region_field {
                    phone = phone.with_region_field(region_field);
                }
                Box::new(phone)
            }
        };
        Ok(cleaner)
    }

    /// Parses `--concat name=a,b,c`.
    pub fn parse_concat(spec: &str, separator: &str) -> Result<Self> {
        let (target, fields) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("Concat spec '{spec}' must look like name=field_a,field_b"))?;
        let target = target.trim();
        if target.is_empty() {
            return Err(anyhow!("Concat spec '{spec}' is missing a target column name"));
        }
        let fields = split_list(fields);
        if fields.is_empty() {
            return Err(anyhow!("Concat spec '{spec}' does not name any source columns"));
        }
        Ok(CleanerSpec::Concat {
            target: target.to_string(),
            fields,
            separator: separator.to_string(),
            null_substitute: String::new(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReshapePlan {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub null_values: Vec<String>,
    #[serde(default)]
    pub cleaners: Vec<CleanerSpec>,
}

impl ReshapePlan {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).context("Parsing reshape plan YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening plan file {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Loading plan from {path:?}"))
    }

    /// Loads `path` when given, otherwise starts from an empty plan.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Command-line values win over plan values; an empty `fields` slice keeps
    /// the plan's list.
    pub fn apply_overrides(&mut self, key: Option<&str>, fields: &[String], limit: Option<usize>) {
        if let Some(key) = key {
            self.key = Some(key.to_string());
        }
        let fields = fields
            .iter()
            .flat_map(|entry| split_list(entry))
            .collect::<Vec<_>>();
        if !fields.is_empty() {
            self.fields = fields;
        }
        if limit.is_some() {
            self.limit = limit;
        }
    }

    pub fn require_key(&self) -> Result<&str> {
        self.key
            .as_deref()
            .ok_or_else(|| anyhow!("A key column is required (use --key or set `key` in the plan)"))
    }

    pub fn require_fields(&self) -> Result<&[String]> {
        if self.fields.is_empty() {
            Err(anyhow!(
                "At least one column is required (use --columns or set `fields` in the plan)"
            ))
        } else {
            Ok(&self.fields)
        }
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn build_cleaners(&self) -> std::result::Result<Vec<Box<dyn ColumnCleaner>>, ReshapeError> {
        self.cleaners.iter().map(CleanerSpec::build).collect()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
