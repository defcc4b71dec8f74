use crate::adapter::ComponentAdapter;
use crate::container::Container;
use crate::cycle::CycleGuard;
use crate::error::{BoxError, Error, Result};
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};
use crate::monitor::{MonitorRef, MonitorSlot};
use std::any::{type_name, Any};
use std::sync::Arc;
use std::time::Instant;

type FactoryFn<T> = Arc<dyn Fn(&Container) -> Result<Arc<T>, BoxError> + Send + Sync>;

/// Produces instances with a closure that receives the container.
pub struct FactoryAdapter<T: ?Sized> {
  key: ComponentKey,
  factory: FactoryFn<T>,
  monitor: MonitorSlot,
}

impl<T: ?Sized + Any + Send + Sync> FactoryAdapter<T> {
  pub fn new(
    key: ComponentKey,
    factory: impl Fn(&Container) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
  ) -> Self {
    Self {
      key,
      factory: Arc::new(factory),
      monitor: MonitorSlot::new(),
    }
  }
}

impl<T: ?Sized + Any + Send + Sync> ComponentAdapter for FactoryAdapter<T> {
  fn key(&self) -> &ComponentKey {
    &self.key
  }

  fn implementation(&self) -> TypeToken {
    TypeToken::of::<T>()
  }

  fn get_instance(&self, container: &Container) -> Result<Instance> {
    let _guard = CycleGuard::enter(container.id(), &self.key)?;
    let monitor = self.monitor.get();
    monitor.instantiating(container.name(), &self.key, "factory");
    let started = Instant::now();
    match (self.factory)(container) {
      Ok(value) => {
        monitor.instantiated(container.name(), &self.key, "factory", started.elapsed());
        Ok(Instance::from_arc(value))
      }
      Err(source) => {
        let err = Error::from_invocation(source, type_name::<T>(), "factory");
        monitor.instantiation_failed(container.name(), &self.key, "factory", &err);
        Err(err)
      }
    }
  }

  fn change_monitor(&self, monitor: MonitorRef) {
    self.monitor.set(monitor);
  }

  fn descriptor(&self) -> String {
    format!("Factory[{}]", self.key)
  }
}
