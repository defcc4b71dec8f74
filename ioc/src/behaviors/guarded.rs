use crate::adapter::ComponentAdapter;
use crate::container::Container;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};

/// Resolves a guard component before producing anything.
///
/// Errors from the guard propagate. A guard registered as `bool` blocks the
/// component while it is `false`; any other guard only has to resolve.
pub struct Guarded {
  delegate: Box<dyn ComponentAdapter>,
  guard: ComponentKey,
}

impl Guarded {
  pub fn new(delegate: Box<dyn ComponentAdapter>, guard: ComponentKey) -> Self {
    Self { delegate, guard }
  }

  pub fn guard(&self) -> &ComponentKey {
    &self.guard
  }

  fn missing(&self) -> Error {
    Error::GuardMissing {
      guard: self.guard.clone(),
      key: self.delegate.key().clone(),
    }
  }
}

impl ComponentAdapter for Guarded {
  fn key(&self) -> &ComponentKey {
    self.delegate.key()
  }

  fn implementation(&self) -> TypeToken {
    self.delegate.implementation()
  }

  fn get_instance(&self, container: &Container) -> Result<Instance> {
    let Some(guard) = container.get_component(&self.guard)? else {
      return Err(self.missing());
    };
    if guard.downcast::<bool>().is_some_and(|allowed| !*allowed) {
      return Err(Error::GuardRejected {
        guard: self.guard.clone(),
        key: self.delegate.key().clone(),
      });
    }
    self.delegate.get_instance(container)
  }

  fn delegate(&self) -> Option<&dyn ComponentAdapter> {
    Some(self.delegate.as_ref())
  }

  fn verify(&self, container: &Container) -> Result<()> {
    if container.adapter(&self.guard).is_none() {
      return Err(self.missing());
    }
    self.delegate.verify(container)
  }

  fn descriptor(&self) -> String {
    format!("Guarded({})", self.delegate.descriptor())
  }
}
