//! String-to-type converters used when a textual value meets a typed parameter.

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::key::TypeToken;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

type ConvertFn = Arc<dyn Fn(&str) -> Result<Instance, String> + Send + Sync>;

/// A registry of converters keyed by target type.
///
/// `Converters::default()` knows the primitive numbers, `bool`, `char`,
/// `String` and `PathBuf`. More can be registered at any time.
pub struct Converters {
  converters: DashMap<TypeId, ConvertFn>,
}

impl Converters {
  /// A registry without any converter.
  pub fn empty() -> Self {
    Self {
      converters: DashMap::new(),
    }
  }

  pub fn register<T: Any + Send + Sync>(
    &self,
    convert: impl Fn(&str) -> Result<T, String> + Send + Sync + 'static,
  ) {
    self.converters.insert(
      TypeId::of::<T>(),
      Arc::new(move |text: &str| convert(text).map(Instance::new)),
    );
  }

  pub fn register_from_str<T>(&self)
  where
    T: FromStr + Any + Send + Sync,
    T::Err: fmt::Display,
  {
    self.register::<T>(|text| text.trim().parse::<T>().map_err(|err| err.to_string()));
  }

  pub fn can_convert(&self, target: &TypeToken) -> bool {
    self.converters.contains_key(&target.id())
  }

  pub fn convert(&self, target: &TypeToken, text: &str) -> Result<Instance> {
    let convert = self
      .converters
      .get(&target.id())
      .map(|entry| entry.value().clone())
      .ok_or_else(|| Error::Conversion {
        target: *target,
        value: text.to_owned(),
        reason: "no converter registered".to_owned(),
      })?;
    convert(text).map_err(|reason| Error::Conversion {
      target: *target,
      value: text.to_owned(),
      reason,
    })
  }
}

impl Default for Converters {
  fn default() -> Self {
    let converters = Self::empty();
    converters.register_from_str::<bool>();
    converters.register_from_str::<char>();
    converters.register_from_str::<i8>();
    converters.register_from_str::<i16>();
    converters.register_from_str::<i32>();
    converters.register_from_str::<i64>();
    converters.register_from_str::<i128>();
    converters.register_from_str::<isize>();
    converters.register_from_str::<u8>();
    converters.register_from_str::<u16>();
    converters.register_from_str::<u32>();
    converters.register_from_str::<u64>();
    converters.register_from_str::<u128>();
    converters.register_from_str::<usize>();
    converters.register_from_str::<f32>();
    converters.register_from_str::<f64>();
    converters.register::<String>(|text| Ok(text.to_owned()));
    converters.register::<PathBuf>(|text| Ok(PathBuf::from(text)));
    converters
  }
}

impl fmt::Debug for Converters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Converters")
      .field("count", &self.converters.len())
      .finish()
  }
}
