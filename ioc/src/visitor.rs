//! Walking a container hierarchy.

use crate::adapter::ComponentAdapter;
use crate::container::Container;
use crate::error::{Error, Result};
use crate::parameter::Parameter;

/// Visits containers, their adapters and the adapters' pinned parameters,
/// parents before children.
pub trait ContainerVisitor {
  /// Returning `false` skips the container and everything below it.
  fn visit_container(&mut self, _container: &Container) -> bool {
    true
  }

  fn visit_adapter(&mut self, _container: &Container, _adapter: &dyn ComponentAdapter) {}

  fn visit_parameter(&mut self, _container: &Container, _adapter: &dyn ComponentAdapter, _parameter: &dyn Parameter) {}
}

/// Collects every verification failure instead of stopping at the first.
#[derive(Debug, Default)]
pub struct VerifyingVisitor {
  errors: Vec<Error>,
}

impl VerifyingVisitor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn errors(&self) -> &[Error] {
    &self.errors
  }

  pub fn finish(self) -> Result<()> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Verification(self.errors))
    }
  }

  fn record(&mut self, err: Error) {
    match err {
      Error::Verification(nested) => self.errors.extend(nested),
      err => self.errors.push(err),
    }
  }
}

impl ContainerVisitor for VerifyingVisitor {
  fn visit_adapter(&mut self, container: &Container, adapter: &dyn ComponentAdapter) {
    if let Err(err) = adapter.verify(container) {
      self.record(err);
    }
  }
}

/// Renders the hierarchy as an indented listing, one adapter per line.
#[derive(Debug, Default)]
pub struct DescribingVisitor {
  out: String,
}

impl DescribingVisitor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn into_string(self) -> String {
    self.out
  }

  fn depth(container: &Container) -> usize {
    let mut depth = 0;
    let mut current = container.parent();
    while let Some(parent) = current {
      depth += 1;
      current = parent.parent();
    }
    depth
  }
}

impl ContainerVisitor for DescribingVisitor {
  fn visit_container(&mut self, container: &Container) -> bool {
    let indent = "  ".repeat(Self::depth(container));
    self
      .out
      .push_str(&format!("{}container '{}' ({})\n", indent, container.name(), container.state()));
    true
  }

  fn visit_adapter(&mut self, container: &Container, adapter: &dyn ComponentAdapter) {
    let indent = "  ".repeat(Self::depth(container) + 1);
    self
      .out
      .push_str(&format!("{}{} => {}\n", indent, adapter.key(), adapter.descriptor()));
  }
}
