//! Component monitors: callbacks fired around instantiation, member
//! invocation and lifecycle phases.

use crate::error::Error;
use crate::key::ComponentKey;
use crate::lifecycle::Transition;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Observes what the container does on behalf of its components.
///
/// Every method has an empty default so monitors only implement what they
/// care about.
pub trait ComponentMonitor: Send + Sync {
  fn instantiating(&self, _container: &str, _key: &ComponentKey, _member: &str) {}

  fn instantiated(&self, _container: &str, _key: &ComponentKey, _member: &str, _elapsed: Duration) {}

  fn instantiation_failed(&self, _container: &str, _key: &ComponentKey, _member: &str, _error: &Error) {}

  fn invoking(&self, _container: &str, _key: &ComponentKey, _member: &str) {}

  fn invoked(&self, _container: &str, _key: &ComponentKey, _member: &str, _elapsed: Duration) {}

  fn lifecycle_invoked(&self, _container: &str, _key: &ComponentKey, _phase: Transition) {}

  fn lifecycle_failed(&self, _container: &str, _key: &ComponentKey, _phase: Transition, _error: &Error) {}

  fn no_component_found(&self, _container: &str, _key: &ComponentKey) {}
}

pub type MonitorRef = Arc<dyn ComponentMonitor>;

/// The default monitor. Reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitor;

impl ComponentMonitor for TracingMonitor {
  fn instantiating(&self, container: &str, key: &ComponentKey, member: &str) {
    trace!(container, key = %key, member, "instantiating component");
  }

  fn instantiated(&self, container: &str, key: &ComponentKey, member: &str, elapsed: Duration) {
    debug!(container, key = %key, member, ?elapsed, "instantiated component");
  }

  fn instantiation_failed(&self, container: &str, key: &ComponentKey, member: &str, error: &Error) {
    warn!(container, key = %key, member, %error, "instantiation failed");
  }

  fn invoking(&self, container: &str, key: &ComponentKey, member: &str) {
    trace!(container, key = %key, member, "invoking injection member");
  }

  fn invoked(&self, container: &str, key: &ComponentKey, member: &str, elapsed: Duration) {
    trace!(container, key = %key, member, ?elapsed, "invoked injection member");
  }

  fn lifecycle_invoked(&self, container: &str, key: &ComponentKey, phase: Transition) {
    debug!(container, key = %key, %phase, "lifecycle callback invoked");
  }

  fn lifecycle_failed(&self, container: &str, key: &ComponentKey, phase: Transition, error: &Error) {
    warn!(container, key = %key, %phase, %error, "lifecycle callback failed");
  }

  fn no_component_found(&self, container: &str, key: &ComponentKey) {
    debug!(container, key = %key, "no component found");
  }
}

/// A monitor that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl ComponentMonitor for NullMonitor {}

/// A replaceable monitor reference held by adapters.
pub(crate) struct MonitorSlot {
  monitor: RwLock<MonitorRef>,
}

impl MonitorSlot {
  pub(crate) fn new() -> Self {
    Self {
      monitor: RwLock::new(Arc::new(TracingMonitor)),
    }
  }

  pub(crate) fn get(&self) -> MonitorRef {
    self.monitor.read().clone()
  }

  pub(crate) fn set(&self, monitor: MonitorRef) {
    *self.monitor.write() = monitor;
  }
}
