use crate::adapter::ComponentAdapter;
use crate::container::Container;
use crate::error::Result;
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};
use parking_lot::ReentrantMutex;

/// Serializes instantiation through this adapter.
///
/// The lock is re-entrant, so a component that ends up requesting itself on
/// the same thread reaches the cycle check instead of deadlocking.
pub struct Locked {
  delegate: Box<dyn ComponentAdapter>,
  lock: ReentrantMutex<()>,
}

impl Locked {
  pub fn new(delegate: Box<dyn ComponentAdapter>) -> Self {
    Self {
      delegate,
      lock: ReentrantMutex::new(()),
    }
  }
}

impl ComponentAdapter for Locked {
  fn key(&self) -> &ComponentKey {
    self.delegate.key()
  }

  fn implementation(&self) -> TypeToken {
    self.delegate.implementation()
  }

  fn get_instance(&self, container: &Container) -> Result<Instance> {
    let _lock = self.lock.lock();
    self.delegate.get_instance(container)
  }

  fn delegate(&self) -> Option<&dyn ComponentAdapter> {
    Some(self.delegate.as_ref())
  }

  fn descriptor(&self) -> String {
    format!("Locked({})", self.delegate.descriptor())
  }
}
