use crate::adapter::ComponentAdapter;
use crate::container::Container;
use crate::error::Result;
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};

/// Instantiates the component when the container starts, lifecycle or not.
pub struct Automated {
  delegate: Box<dyn ComponentAdapter>,
}

impl Automated {
  pub fn new(delegate: Box<dyn ComponentAdapter>) -> Self {
    Self { delegate }
  }
}

impl ComponentAdapter for Automated {
  fn key(&self) -> &ComponentKey {
    self.delegate.key()
  }

  fn implementation(&self) -> TypeToken {
    self.delegate.implementation()
  }

  fn get_instance(&self, container: &Container) -> Result<Instance> {
    self.delegate.get_instance(container)
  }

  fn delegate(&self) -> Option<&dyn ComponentAdapter> {
    Some(self.delegate.as_ref())
  }

  fn has_lifecycle(&self) -> bool {
    true
  }

  fn start(&self, container: &Container) -> Result<()> {
    self.delegate.get_instance(container)?;
    self.delegate.start(container)
  }

  fn descriptor(&self) -> String {
    format!("Automated({})", self.delegate.descriptor())
  }
}
