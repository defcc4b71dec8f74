use serde::Deserialize;
use std::collections::BTreeMap;

// --- Top Level Config ---
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigRaw {
  #[serde(default = "default_name")]
  pub name: String,
  #[serde(default = "default_caching")]
  pub caching: bool,
  #[serde(default)]
  pub locking: bool,
  #[serde(default)]
  pub use_names: bool,
  #[serde(default)]
  pub allow_empty_collections: bool,
  // Ordered so properties register deterministically.
  #[serde(default)]
  pub properties: BTreeMap<String, PropertyValueRaw>,
}

fn default_name() -> String {
  "root".to_string()
}

fn default_caching() -> bool {
  true
}

impl Default for ConfigRaw {
  fn default() -> Self {
    Self {
      name: default_name(),
      caching: default_caching(),
      locking: false,
      use_names: false,
      allow_empty_collections: false,
      properties: BTreeMap::new(),
    }
  }
}

// --- Properties ---

/// Property values as YAML writes them. All end up as strings.
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum PropertyValueRaw {
  Bool(bool),
  Integer(i64),
  Float(f64),
  Text(String),
}
