use super::{unsatisfiable, Plan, Target};
use crate::adapter::ComponentAdapter;
use crate::blueprint::{Arguments, ParameterSpec};
use crate::container::Container;
use crate::cycle::CycleGuard;
use crate::error::{BoxError, Error, Result};
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};
use crate::monitor::{MonitorRef, MonitorSlot};
use crate::parameter::ParameterRef;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

type ProvideFn<T> = Arc<dyn Fn(&Arguments) -> Result<Arc<T>, BoxError> + Send + Sync>;

/// A user supplied function producing a `T` from declared parameters.
///
/// ```
/// use std::sync::Arc;
/// use trellis_ioc::{Container, ParameterSpec, Provider};
///
/// let container = Container::new();
/// container.add_instance(8080_u16).unwrap();
/// container
///   .add_provider(
///     "address",
///     Provider::new("address", vec![ParameterSpec::of::<u16>()], |args| {
///       Ok(Arc::new(format!("localhost:{}", args.value::<u16>(0)?)))
///     }),
///   )
///   .unwrap();
/// let address = container.get_by_key::<String>("address").unwrap().unwrap();
/// assert_eq!(*address, "localhost:8080");
/// ```
pub struct Provider<T: ?Sized> {
  name: String,
  params: Vec<ParameterSpec>,
  provide: ProvideFn<T>,
}

impl<T: ?Sized + Any + Send + Sync> Provider<T> {
  pub fn new(
    name: &str,
    params: Vec<ParameterSpec>,
    provide: impl Fn(&Arguments) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
  ) -> Self {
    Self {
      name: name.to_owned(),
      params,
      provide: Arc::new(provide),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn params(&self) -> &[ParameterSpec] {
    &self.params
  }
}

impl<T: ?Sized> Clone for Provider<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      params: self.params.clone(),
      provide: self.provide.clone(),
    }
  }
}

impl<T: ?Sized> fmt::Debug for Provider<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Provider")
      .field("name", &self.name)
      .field("params", &self.params)
      .finish()
  }
}

/// Produces instances by calling a [`Provider`].
pub struct ProviderAdapter<T: ?Sized> {
  key: ComponentKey,
  provider: Provider<T>,
  parameters: Option<Vec<ParameterRef>>,
  use_names: bool,
  allow_empty: bool,
  monitor: MonitorSlot,
}

impl<T: ?Sized + Any + Send + Sync> ProviderAdapter<T> {
  pub fn new(
    key: ComponentKey,
    provider: Provider<T>,
    parameters: Option<Vec<ParameterRef>>,
    use_names: bool,
    allow_empty: bool,
  ) -> Self {
    Self {
      key,
      provider,
      parameters,
      use_names,
      allow_empty,
      monitor: MonitorSlot::new(),
    }
  }

  fn target(&self) -> Target<'_> {
    Target {
      key: &self.key,
      implementation: type_name::<T>(),
      use_names: self.use_names,
      allow_empty: self.allow_empty,
    }
  }

  fn plan(&self, container: &Container) -> Result<Plan> {
    let plan = Plan::resolve(container, self.target(), self.provider.params(), self.parameters.as_deref())?;
    if plan.is_satisfied() {
      Ok(plan)
    } else {
      Err(unsatisfiable(container, type_name::<T>(), plan.unsatisfied().to_vec()))
    }
  }
}

impl<T: ?Sized + Any + Send + Sync> ComponentAdapter for ProviderAdapter<T> {
  fn key(&self) -> &ComponentKey {
    &self.key
  }

  fn implementation(&self) -> TypeToken {
    TypeToken::of::<T>()
  }

  fn get_instance(&self, container: &Container) -> Result<Instance> {
    let _guard = CycleGuard::enter(container.id(), &self.key)?;
    let args = self.plan(container)?.arguments(self.provider.name())?;
    let monitor = self.monitor.get();
    monitor.instantiating(container.name(), &self.key, self.provider.name());
    let started = Instant::now();
    match (self.provider.provide)(&args) {
      Ok(value) => {
        monitor.instantiated(container.name(), &self.key, self.provider.name(), started.elapsed());
        Ok(Instance::from_arc(value))
      }
      Err(source) => {
        let err = Error::from_invocation(source, type_name::<T>(), self.provider.name());
        monitor.instantiation_failed(container.name(), &self.key, self.provider.name(), &err);
        Err(err)
      }
    }
  }

  fn parameters(&self) -> &[ParameterRef] {
    self.parameters.as_deref().unwrap_or(&[])
  }

  fn verify(&self, container: &Container) -> Result<()> {
    let _guard = CycleGuard::verifying(container.id(), &self.key)?;
    self.plan(container)?;
    Plan::verify(container, self.target(), self.provider.params(), self.parameters.as_deref())
  }

  fn change_monitor(&self, monitor: MonitorRef) {
    self.monitor.set(monitor);
  }

  fn descriptor(&self) -> String {
    format!("Provider[{}]", self.key)
  }
}
