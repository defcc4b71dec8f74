use crate::adapter::ComponentAdapter;
use crate::container::Container;
use crate::error::{BoxError, Error, Result};
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type DecorateFn = Arc<dyn Fn(&Instance) -> Result<(), BoxError> + Send + Sync>;

/// A callback run on every newly produced instance of `T`.
#[derive(Clone)]
pub struct Decorating {
  token: TypeToken,
  decorate: DecorateFn,
}

impl Decorating {
  pub fn new<T: ?Sized + Any + Send + Sync>(decorate: impl Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static) -> Self {
    Self {
      token: TypeToken::of::<T>(),
      decorate: Arc::new(move |instance: &Instance| match instance.downcast::<T>() {
        Some(value) => decorate(&*value),
        None => Ok(()),
      }),
    }
  }
}

impl fmt::Debug for Decorating {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Decorating({})", self.token)
  }
}

pub struct Decorated {
  delegate: Box<dyn ComponentAdapter>,
  decorating: Decorating,
}

impl Decorated {
  pub fn new(delegate: Box<dyn ComponentAdapter>, decorating: Decorating) -> Self {
    Self { delegate, decorating }
  }
}

impl ComponentAdapter for Decorated {
  fn key(&self) -> &ComponentKey {
    self.delegate.key()
  }

  fn implementation(&self) -> TypeToken {
    self.delegate.implementation()
  }

  fn get_instance(&self, container: &Container) -> Result<Instance> {
    let instance = self.delegate.get_instance(container)?;
    (self.decorating.decorate)(&instance)
      .map_err(|source| Error::from_invocation(source, self.implementation().name(), "decorate"))?;
    Ok(instance)
  }

  fn delegate(&self) -> Option<&dyn ComponentAdapter> {
    Some(self.delegate.as_ref())
  }

  fn descriptor(&self) -> String {
    format!("Decorated({})", self.delegate.descriptor())
  }
}
