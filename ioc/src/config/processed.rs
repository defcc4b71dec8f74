use crate::config::raw::{ConfigRaw, PropertyValueRaw};
use crate::error::{Error, Result};
use crate::registration::Defaults;

// --- Processed Config ---
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
  pub name: String,
  pub defaults: Defaults,
  /// `(key, value)` pairs in key order.
  pub properties: Vec<(String, String)>,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      name: "root".to_string(),
      defaults: Defaults::default(),
      properties: Vec::new(),
    }
  }
}

pub fn process_raw_config(raw_config: ConfigRaw) -> Result<ContainerConfig> {
  let name = raw_config.name.trim().to_string();
  if name.is_empty() {
    return Err(Error::InvalidConfigValue {
      field: "name".to_string(),
      message: "Container name cannot be empty.".to_string(),
    });
  }
  if name.contains('/') {
    return Err(Error::InvalidConfigValue {
      field: "name".to_string(),
      message: format!("Container name '{}' cannot contain '/'; it separates child names.", name),
    });
  }

  let mut properties = Vec::with_capacity(raw_config.properties.len());
  for (key, value) in raw_config.properties {
    if key.trim().is_empty() {
      return Err(Error::InvalidConfigValue {
        field: "properties".to_string(),
        message: "Property keys cannot be empty.".to_string(),
      });
    }
    let text = process_property_value(&key, value)?;
    properties.push((key, text));
  }

  Ok(ContainerConfig {
    name,
    defaults: Defaults {
      cache: raw_config.caching,
      lock: raw_config.locking,
      use_names: raw_config.use_names,
      allow_empty_collections: raw_config.allow_empty_collections,
    },
    properties,
  })
}

fn process_property_value(key: &str, value: PropertyValueRaw) -> Result<String> {
  match value {
    PropertyValueRaw::Bool(flag) => Ok(flag.to_string()),
    PropertyValueRaw::Integer(number) => Ok(number.to_string()),
    PropertyValueRaw::Float(number) if number.is_finite() => Ok(number.to_string()),
    PropertyValueRaw::Float(number) => Err(Error::InvalidConfigValue {
      field: format!("properties.{}", key),
      message: format!("Property value {} is not a finite number.", number),
    }),
    PropertyValueRaw::Text(text) => Ok(text),
  }
}
