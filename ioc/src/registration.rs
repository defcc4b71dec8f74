//! Registrations: what to register, under which key and with which behaviors.

use crate::adapter::{AdapterRef, ComponentAdapter};
use crate::behaviors::{Automated, BehaviorFactory, BehaviorStack, Cached, Decorated, Decorating, Guarded, Locked};
use crate::blueprint::{Blueprint, Injectable};
use crate::container::Container;
use crate::error::BoxError;
use crate::injectors::{FactoryAdapter, Injection, Injector, InstanceAdapter, Provider, ProviderAdapter};
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};
use crate::lifecycle::{Lifecycle, LifecycleHook};
use crate::parameter::ParameterRef;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Container-wide defaults for registration characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
  pub cache: bool,
  pub lock: bool,
  pub use_names: bool,
  pub allow_empty_collections: bool,
}

impl Default for Defaults {
  fn default() -> Self {
    Self {
      cache: true,
      lock: false,
      use_names: false,
      allow_empty_collections: false,
    }
  }
}

/// Per-registration characteristics. Unset values fall back to the
/// container's [`Defaults`].
#[derive(Clone, Default)]
pub struct Characteristics {
  cache: Option<bool>,
  lock: Option<bool>,
  guard: Option<ComponentKey>,
  automatic: bool,
  use_names: Option<bool>,
  injection: Injection,
  parameters: Option<Vec<ParameterRef>>,
}

impl Characteristics {
  pub fn cache(&self, defaults: &Defaults) -> bool {
    self.cache.unwrap_or(defaults.cache)
  }

  pub fn lock(&self, defaults: &Defaults) -> bool {
    self.lock.unwrap_or(defaults.lock)
  }

  pub fn use_names(&self, defaults: &Defaults) -> bool {
    self.use_names.unwrap_or(defaults.use_names)
  }

  pub fn guard(&self) -> Option<&ComponentKey> {
    self.guard.as_ref()
  }

  pub fn automatic(&self) -> bool {
    self.automatic
  }

  pub fn injection(&self) -> &Injection {
    &self.injection
  }

  pub fn parameters(&self) -> Option<&[ParameterRef]> {
    self.parameters.as_deref()
  }
}

impl fmt::Debug for Characteristics {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Characteristics")
      .field("cache", &self.cache)
      .field("lock", &self.lock)
      .field("guard", &self.guard)
      .field("automatic", &self.automatic)
      .field("use_names", &self.use_names)
      .field("injection", &self.injection)
      .field("parameters", &self.parameters.as_ref().map(Vec::len))
      .finish()
  }
}

/// What a base adapter is built from once the key and characteristics are
/// settled.
pub(crate) struct BuildContext {
  pub(crate) key: ComponentKey,
  pub(crate) injection: Injection,
  pub(crate) parameters: Option<Vec<ParameterRef>>,
  pub(crate) use_names: bool,
  pub(crate) allow_empty: bool,
}

type Build = Box<dyn FnOnce(BuildContext) -> Box<dyn ComponentAdapter> + Send>;

/// A component waiting to be added to a container.
///
/// ```
/// use trellis_ioc::{Blueprint, Container, Registration};
///
/// struct Clock;
///
/// let container = Container::new();
/// container
///   .register(
///     Registration::component(Blueprint::<Clock>::new().default_constructor(|| Clock))
///       .key("clock")
///       .cached(false),
///   )
///   .unwrap();
/// assert!(container.get_component("clock").unwrap().is_some());
/// ```
pub struct Registration {
  key: ComponentKey,
  implementation: TypeToken,
  build: Build,
  cacheable: bool,
  characteristics: Characteristics,
  decorators: Vec<Decorating>,
  behaviors: Option<BehaviorStack>,
}

impl Registration {
  fn new(key: ComponentKey, implementation: TypeToken, cacheable: bool, build: Build) -> Self {
    Self {
      key,
      implementation,
      build,
      cacheable,
      characteristics: Characteristics::default(),
      decorators: Vec::new(),
      behaviors: None,
    }
  }

  /// A component built from its blueprint, keyed by its type.
  pub fn component<T: Any + Send + Sync>(blueprint: Blueprint<T>) -> Self {
    Self::new(
      ComponentKey::of::<T>(),
      TypeToken::of::<T>(),
      true,
      Box::new(move |cx: BuildContext| -> Box<dyn ComponentAdapter> {
        Box::new(Injector::new(cx.key, blueprint, cx.injection, cx.parameters, cx.use_names, cx.allow_empty))
      }),
    )
  }

  pub fn injectable<T: Injectable>() -> Self {
    Self::component(T::blueprint())
  }

  /// A pre-built instance, keyed by its type.
  pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
    Self::shared(Arc::new(value))
  }

  /// A pre-built instance whose start/stop/dispose callbacks the container
  /// drives.
  pub fn managed_instance<T: Lifecycle + Any>(value: T) -> Self {
    let instance = Instance::new(value);
    Self::new(
      ComponentKey::of::<T>(),
      TypeToken::of::<T>(),
      false,
      Box::new(move |cx: BuildContext| -> Box<dyn ComponentAdapter> {
        Box::new(InstanceAdapter::new(cx.key, instance).with_lifecycle(LifecycleHook::of::<T>()))
      }),
    )
  }

  /// An already shared value, possibly a trait object, keyed by its type.
  pub fn shared<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    let instance = Instance::from_arc(value);
    Self::new(
      ComponentKey::of::<T>(),
      TypeToken::of::<T>(),
      false,
      Box::new(move |cx: BuildContext| -> Box<dyn ComponentAdapter> {
        Box::new(InstanceAdapter::new(cx.key, instance))
      }),
    )
  }

  pub fn provider<T: ?Sized + Any + Send + Sync>(provider: Provider<T>) -> Self {
    Self::new(
      ComponentKey::of::<T>(),
      TypeToken::of::<T>(),
      true,
      Box::new(move |cx: BuildContext| -> Box<dyn ComponentAdapter> {
        Box::new(ProviderAdapter::new(cx.key, provider, cx.parameters, cx.use_names, cx.allow_empty))
      }),
    )
  }

  /// A closure with access to the container it is registered in.
  pub fn factory<T: ?Sized + Any + Send + Sync>(
    factory: impl Fn(&Container) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
  ) -> Self {
    Self::new(
      ComponentKey::of::<T>(),
      TypeToken::of::<T>(),
      true,
      Box::new(move |cx: BuildContext| -> Box<dyn ComponentAdapter> {
        Box::new(FactoryAdapter::<T>::new(cx.key, factory))
      }),
    )
  }

  pub fn key(mut self, key: impl Into<ComponentKey>) -> Self {
    self.key = key.into();
    self
  }

  /// Pins the constructor (or provider) arguments.
  pub fn parameters(mut self, parameters: Vec<ParameterRef>) -> Self {
    self.characteristics.parameters = Some(parameters);
    self
  }

  pub fn injection(mut self, injection: Injection) -> Self {
    self.characteristics.injection = injection;
    self
  }

  pub fn cached(mut self, cache: bool) -> Self {
    self.characteristics.cache = Some(cache);
    self
  }

  pub fn locked(mut self, lock: bool) -> Self {
    self.characteristics.lock = Some(lock);
    self
  }

  /// Only produce the component while the guard component allows it.
  pub fn guarded_by(mut self, guard: impl Into<ComponentKey>) -> Self {
    self.characteristics.guard = Some(guard.into());
    self
  }

  /// Instantiate the component when the container starts.
  pub fn automatic(mut self) -> Self {
    self.characteristics.automatic = true;
    self
  }

  pub fn use_names(mut self, use_names: bool) -> Self {
    self.characteristics.use_names = Some(use_names);
    self
  }

  /// Runs `decorate` on every newly produced instance.
  pub fn decorated<T: ?Sized + Any + Send + Sync>(
    mut self,
    decorate: impl Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
  ) -> Self {
    self.decorators.push(Decorating::new::<T>(decorate));
    self
  }

  /// Extra behaviors wrapped around the standard ones, innermost first.
  pub fn behaviors(mut self, behaviors: BehaviorStack) -> Self {
    self.behaviors = Some(behaviors);
    self
  }

  pub fn component_key(&self) -> &ComponentKey {
    &self.key
  }

  pub fn implementation(&self) -> TypeToken {
    self.implementation
  }

  pub fn characteristics(&self) -> &Characteristics {
    &self.characteristics
  }

  /// Builds the adapter chain, from the inside out: base adapter,
  /// decorators, guard, cache, lock, automatic start, extra behaviors.
  pub(crate) fn into_adapter(self, defaults: &Defaults) -> AdapterRef {
    let Registration {
      key,
      build,
      cacheable,
      characteristics,
      decorators,
      behaviors,
      ..
    } = self;

    let mut adapter = build(BuildContext {
      key,
      injection: characteristics.injection.clone(),
      parameters: characteristics.parameters.clone(),
      use_names: characteristics.use_names(defaults),
      allow_empty: defaults.allow_empty_collections,
    });
    for decorating in decorators {
      adapter = Box::new(Decorated::new(adapter, decorating));
    }
    if let Some(guard) = characteristics.guard.clone() {
      adapter = Box::new(Guarded::new(adapter, guard));
    }
    if cacheable && characteristics.cache(defaults) {
      adapter = Box::new(Cached::new(adapter));
    }
    if characteristics.lock(defaults) {
      adapter = Box::new(Locked::new(adapter));
    }
    if characteristics.automatic {
      adapter = Box::new(Automated::new(adapter));
    }
    if let Some(behaviors) = behaviors {
      adapter = BehaviorFactory::wrap(&behaviors, adapter);
    }
    Arc::from(adapter)
  }
}

impl fmt::Debug for Registration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registration")
      .field("key", &self.key)
      .field("implementation", &self.implementation)
      .field("characteristics", &self.characteristics)
      .finish()
  }
}
