use crate::adapter::ComponentAdapter;
use crate::container::Container;
use crate::error::Result;
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};
use crate::lifecycle::{advance, run_phase, LifecycleState, Transition};
use crate::monitor::{MonitorRef, MonitorSlot};
use parking_lot::Mutex;

/// Produces the instance once and hands out the same one afterwards.
///
/// Also owns the lifecycle of the cached component: starting instantiates
/// and starts it, stopping stops it, disposing disposes it and drops it.
/// Without a [`Locked`](super::Locked) wrapper, two threads racing on the
/// first request may both construct; the first stored instance wins.
pub struct Cached {
  delegate: Box<dyn ComponentAdapter>,
  stored: Mutex<Option<Instance>>,
  state: Mutex<LifecycleState>,
  monitor: MonitorSlot,
}

impl Cached {
  pub fn new(delegate: Box<dyn ComponentAdapter>) -> Self {
    Self {
      delegate,
      stored: Mutex::new(None),
      state: Mutex::new(LifecycleState::Constructed),
      monitor: MonitorSlot::new(),
    }
  }

  /// Forgets the cached instance.
  pub fn flush(&self) {
    self.stored.lock().take();
  }

  pub fn stored(&self) -> Option<Instance> {
    self.stored.lock().clone()
  }

  pub fn state(&self) -> LifecycleState {
    *self.state.lock()
  }

  fn target(&self) -> String {
    format!("component {}", self.delegate.key())
  }
}

impl ComponentAdapter for Cached {
  fn key(&self) -> &ComponentKey {
    self.delegate.key()
  }

  fn implementation(&self) -> TypeToken {
    self.delegate.implementation()
  }

  fn get_instance(&self, container: &Container) -> Result<Instance> {
    if let Some(instance) = self.stored() {
      return Ok(instance);
    }
    let produced = self.delegate.get_instance(container)?;
    let mut stored = self.stored.lock();
    Ok(stored.get_or_insert(produced).clone())
  }

  fn delegate(&self) -> Option<&dyn ComponentAdapter> {
    Some(self.delegate.as_ref())
  }

  fn start(&self, container: &Container) -> Result<()> {
    let Some(hook) = self.lifecycle_hook() else {
      return self.delegate.start(container);
    };
    advance(&self.state, || self.target(), Transition::Start)?;
    let instance = self.get_instance(container)?;
    run_phase(hook, &instance, self.key(), container.name(), Transition::Start, self.monitor.get().as_ref())
  }

  fn stop(&self, container: &Container) -> Result<()> {
    let Some(hook) = self.lifecycle_hook() else {
      return self.delegate.stop(container);
    };
    if !self.state().is_started() {
      return Ok(());
    }
    advance(&self.state, || self.target(), Transition::Stop)?;
    match self.stored() {
      Some(instance) => run_phase(hook, &instance, self.key(), container.name(), Transition::Stop, self.monitor.get().as_ref()),
      None => Ok(()),
    }
  }

  fn dispose(&self, container: &Container) -> Result<()> {
    if self.state().is_disposed() {
      return Ok(());
    }
    advance(&self.state, || self.target(), Transition::Dispose)?;
    let result = match (self.lifecycle_hook(), self.stored()) {
      (Some(hook), Some(instance)) => run_phase(
        hook,
        &instance,
        self.key(),
        container.name(),
        Transition::Dispose,
        self.monitor.get().as_ref(),
      ),
      _ => self.delegate.dispose(container),
    };
    self.flush();
    result
  }

  fn change_monitor(&self, monitor: MonitorRef) {
    self.monitor.set(monitor.clone());
    self.delegate.change_monitor(monitor);
  }

  fn descriptor(&self) -> String {
    format!("Cached({})", self.delegate.descriptor())
  }
}
