//! The `ComponentAdapter` contract shared by injectors and behaviors.

use crate::container::Container;
use crate::error::Result;
use crate::instance::{Facet, Instance};
use crate::key::{ComponentKey, TypeToken};
use crate::lifecycle::LifecycleHook;
use crate::monitor::MonitorRef;
use crate::parameter::ParameterRef;
use std::sync::Arc;

pub type AdapterRef = Arc<dyn ComponentAdapter>;

/// Produces the instance registered under one key.
///
/// Injectors produce instances themselves; behaviors wrap another adapter
/// and return it from [`delegate`](ComponentAdapter::delegate). Every method
/// other than `key`, `implementation` and `get_instance` has a default that
/// forwards to the delegate, so a behavior only overrides what it changes
/// and the chain stays intact.
pub trait ComponentAdapter: Send + Sync {
  fn key(&self) -> &ComponentKey;

  /// The type instances are produced as.
  fn implementation(&self) -> TypeToken;

  /// Produces an instance. `container` is the container this adapter is
  /// registered in, seen through the handle the lookup went through.
  fn get_instance(&self, container: &Container) -> Result<Instance>;

  fn delegate(&self) -> Option<&dyn ComponentAdapter> {
    None
  }

  /// Additional types the implementation can be viewed as.
  fn facets(&self) -> &[Facet] {
    match self.delegate() {
      Some(delegate) => delegate.facets(),
      None => &[],
    }
  }

  fn provides(&self, token: &TypeToken) -> bool {
    self.implementation() == *token || self.facets().iter().any(|facet| facet.token() == *token)
  }

  /// Explicit parameters the adapter was registered with, if any.
  fn parameters(&self) -> &[ParameterRef] {
    match self.delegate() {
      Some(delegate) => delegate.parameters(),
      None => &[],
    }
  }

  fn lifecycle_hook(&self) -> Option<&LifecycleHook> {
    self.delegate().and_then(|delegate| delegate.lifecycle_hook())
  }

  /// `true` if container start/stop/dispose have something to do here.
  fn has_lifecycle(&self) -> bool {
    match self.delegate() {
      Some(delegate) => delegate.has_lifecycle(),
      None => self.lifecycle_hook().is_some(),
    }
  }

  /// Checks that the adapter could produce an instance, without producing one.
  fn verify(&self, container: &Container) -> Result<()> {
    match self.delegate() {
      Some(delegate) => delegate.verify(container),
      None => Ok(()),
    }
  }

  fn start(&self, container: &Container) -> Result<()> {
    match self.delegate() {
      Some(delegate) => delegate.start(container),
      None => Ok(()),
    }
  }

  fn stop(&self, container: &Container) -> Result<()> {
    match self.delegate() {
      Some(delegate) => delegate.stop(container),
      None => Ok(()),
    }
  }

  fn dispose(&self, container: &Container) -> Result<()> {
    match self.delegate() {
      Some(delegate) => delegate.dispose(container),
      None => Ok(()),
    }
  }

  fn change_monitor(&self, monitor: MonitorRef) {
    if let Some(delegate) = self.delegate() {
      delegate.change_monitor(monitor);
    }
  }

  /// A short description such as `Cached(ConstructorInjection[app::Service])`.
  fn descriptor(&self) -> String {
    match self.delegate() {
      Some(delegate) => delegate.descriptor(),
      None => format!("Adapter[{}]", self.key()),
    }
  }
}

/// Views `instance`, produced by `adapter`, as `into`.
pub(crate) fn cast_instance(adapter: &dyn ComponentAdapter, instance: Instance, into: &TypeToken) -> Option<Instance> {
  if instance.token() == *into {
    return Some(instance);
  }
  adapter
    .facets()
    .iter()
    .find(|facet| facet.token() == *into)
    .and_then(|facet| facet.cast(&instance))
}
