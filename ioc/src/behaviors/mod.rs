//! Behaviors: adapters that wrap another adapter and add one concern.
//!
//! A behavior only overrides the [`ComponentAdapter`] methods it changes;
//! everything else reaches the wrapped adapter through the trait's
//! forwarding defaults.

mod automated;
mod cached;
mod decorated;
mod guarded;
mod locked;

pub use automated::Automated;
pub use cached::Cached;
pub use decorated::{Decorated, Decorating};
pub use guarded::Guarded;
pub use locked::Locked;

use crate::adapter::ComponentAdapter;
use crate::key::ComponentKey;
use std::fmt;
use std::sync::Arc;

/// Wraps adapters in a behavior.
pub trait BehaviorFactory: Send + Sync {
  fn wrap(&self, adapter: Box<dyn ComponentAdapter>) -> Box<dyn ComponentAdapter>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Caching;

impl BehaviorFactory for Caching {
  fn wrap(&self, adapter: Box<dyn ComponentAdapter>) -> Box<dyn ComponentAdapter> {
    Box::new(Cached::new(adapter))
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Locking;

impl BehaviorFactory for Locking {
  fn wrap(&self, adapter: Box<dyn ComponentAdapter>) -> Box<dyn ComponentAdapter> {
    Box::new(Locked::new(adapter))
  }
}

#[derive(Debug, Clone)]
pub struct Guarding {
  guard: ComponentKey,
}

impl Guarding {
  pub fn new(guard: impl Into<ComponentKey>) -> Self {
    Self { guard: guard.into() }
  }
}

impl BehaviorFactory for Guarding {
  fn wrap(&self, adapter: Box<dyn ComponentAdapter>) -> Box<dyn ComponentAdapter> {
    Box::new(Guarded::new(adapter, self.guard.clone()))
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Automating;

impl BehaviorFactory for Automating {
  fn wrap(&self, adapter: Box<dyn ComponentAdapter>) -> Box<dyn ComponentAdapter> {
    Box::new(Automated::new(adapter))
  }
}

impl BehaviorFactory for Decorating {
  fn wrap(&self, adapter: Box<dyn ComponentAdapter>) -> Box<dyn ComponentAdapter> {
    Box::new(Decorated::new(adapter, self.clone()))
  }
}

/// Behaviors applied in order, the first one innermost.
///
/// ```
/// use trellis_ioc::behaviors::{BehaviorStack, Caching, Locking};
///
/// let stack = BehaviorStack::new().wrap(Caching).wrap(Locking);
/// assert_eq!(stack.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct BehaviorStack {
  factories: Vec<Arc<dyn BehaviorFactory>>,
}

impl BehaviorStack {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn wrap(mut self, factory: impl BehaviorFactory + 'static) -> Self {
    self.factories.push(Arc::new(factory));
    self
  }

  pub fn len(&self) -> usize {
    self.factories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.factories.is_empty()
  }
}

impl BehaviorFactory for BehaviorStack {
  fn wrap(&self, adapter: Box<dyn ComponentAdapter>) -> Box<dyn ComponentAdapter> {
    self
      .factories
      .iter()
      .fold(adapter, |adapter, factory| factory.wrap(adapter))
  }
}

impl fmt::Debug for BehaviorStack {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BehaviorStack")
      .field("len", &self.factories.len())
      .finish()
  }
}
