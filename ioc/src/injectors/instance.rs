use crate::adapter::ComponentAdapter;
use crate::container::Container;
use crate::error::Result;
use crate::instance::{Facet, Instance};
use crate::key::{ComponentKey, TypeToken};
use crate::lifecycle::{advance, run_phase, LifecycleHook, LifecycleState, Transition};
use crate::monitor::{MonitorRef, MonitorSlot};
use parking_lot::Mutex;

/// Hands out one pre-built instance.
pub struct InstanceAdapter {
  key: ComponentKey,
  instance: Instance,
  facets: Vec<Facet>,
  lifecycle: Option<LifecycleHook>,
  state: Mutex<LifecycleState>,
  monitor: MonitorSlot,
}

impl InstanceAdapter {
  pub fn new(key: ComponentKey, instance: Instance) -> Self {
    Self {
      key,
      instance,
      facets: Vec::new(),
      lifecycle: None,
      state: Mutex::new(LifecycleState::Constructed),
      monitor: MonitorSlot::new(),
    }
  }

  pub fn with_lifecycle(mut self, hook: LifecycleHook) -> Self {
    self.lifecycle = Some(hook);
    self
  }

  pub fn with_facet(mut self, facet: Facet) -> Self {
    self.facets.push(facet);
    self
  }

  pub fn state(&self) -> LifecycleState {
    *self.state.lock()
  }

  fn transition(&self, container: &Container, phase: Transition) -> Result<()> {
    let Some(hook) = &self.lifecycle else {
      return Ok(());
    };
    advance(&self.state, || format!("component {}", self.key), phase)?;
    run_phase(hook, &self.instance, &self.key, container.name(), phase, self.monitor.get().as_ref())
  }
}

impl ComponentAdapter for InstanceAdapter {
  fn key(&self) -> &ComponentKey {
    &self.key
  }

  fn implementation(&self) -> TypeToken {
    self.instance.token()
  }

  fn get_instance(&self, _container: &Container) -> Result<Instance> {
    Ok(self.instance.clone())
  }

  fn facets(&self) -> &[Facet] {
    &self.facets
  }

  fn lifecycle_hook(&self) -> Option<&LifecycleHook> {
    self.lifecycle.as_ref()
  }

  fn start(&self, container: &Container) -> Result<()> {
    self.transition(container, Transition::Start)
  }

  fn stop(&self, container: &Container) -> Result<()> {
    if !self.state().is_started() {
      return Ok(());
    }
    self.transition(container, Transition::Stop)
  }

  fn dispose(&self, container: &Container) -> Result<()> {
    if self.state().is_disposed() {
      return Ok(());
    }
    self.transition(container, Transition::Dispose)
  }

  fn change_monitor(&self, monitor: MonitorRef) {
    self.monitor.set(monitor);
  }

  fn descriptor(&self) -> String {
    format!("Instance[{}]", self.key)
  }
}
