//! The main `Container` struct and its associated methods.

use crate::adapter::{cast_instance, AdapterRef, ComponentAdapter};
use crate::blueprint::{Argument, Injectable, ParameterSpec};
use crate::config::ContainerConfig;
use crate::convert::Converters;
use crate::error::{BoxError, Error, Result};
use crate::injectors::Provider;
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};
use crate::lifecycle::{advance, LifecycleState, Transition};
use crate::monitor::{MonitorRef, TracingMonitor};
use crate::parameter::{resolve_single, ParameterRequest};
use crate::registration::{Defaults, Registration};
use crate::visitor::{ContainerVisitor, VerifyingVisitor};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, debug_span};

/// How far up the hierarchy lookups through a handle may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
  Ancestors,
  /// Only this container. Tiered children see their parent this way.
  Local,
}

#[derive(Default)]
struct Registry {
  adapters: Vec<AdapterRef>,
  index: HashMap<ComponentKey, usize>,
}

impl Registry {
  fn get(&self, key: &ComponentKey) -> Option<AdapterRef> {
    self.index.get(key).map(|&slot| self.adapters[slot].clone())
  }

  fn reindex(&mut self) {
    self.index = self
      .adapters
      .iter()
      .enumerate()
      .map(|(slot, adapter)| (adapter.key().clone(), slot))
      .collect();
  }
}

struct ContainerInner {
  name: String,
  registry: RwLock<Registry>,
  parent: Option<Container>,
  children: RwLock<Vec<Weak<ContainerInner>>>,
  state: Mutex<LifecycleState>,
  monitor: RwLock<MonitorRef>,
  converters: Arc<Converters>,
  defaults: Defaults,
  next_child: AtomicUsize,
}

/// The Inversion of Control (IoC) container.
///
/// A `Container` is a cheap, shareable handle: clones refer to the same
/// registry. Components are looked up locally first, then in the parent.
/// It is thread-safe and allows registration at any time; the registry lock
/// is never held while component code runs.
#[derive(Clone)]
pub struct Container {
  inner: Arc<ContainerInner>,
  reach: Reach,
}

impl Container {
  /// Creates a new, empty root container named `root`.
  pub fn new() -> Self {
    Self::named("root")
  }

  pub fn named(name: impl Into<String>) -> Self {
    Self::with_defaults(name, Defaults::default())
  }

  pub fn with_defaults(name: impl Into<String>, defaults: Defaults) -> Self {
    Self::build(name.into(), defaults, Arc::new(Converters::default()), None, Arc::new(TracingMonitor))
  }

  /// Creates a root container from configuration. Configured properties are
  /// registered as `String` components under their names.
  pub fn from_config(config: &ContainerConfig) -> Result<Self> {
    let container = Self::with_defaults(config.name.clone(), config.defaults);
    for (name, value) in &config.properties {
      container.add_instance_with_key(name.as_str(), value.clone())?;
    }
    debug!(
      container = %container.name(),
      properties = config.properties.len(),
      "container created from configuration"
    );
    Ok(container)
  }

  fn build(
    name: String,
    defaults: Defaults,
    converters: Arc<Converters>,
    parent: Option<Container>,
    monitor: MonitorRef,
  ) -> Self {
    Self {
      inner: Arc::new(ContainerInner {
        name,
        registry: RwLock::new(Registry::default()),
        parent,
        children: RwLock::new(Vec::new()),
        state: Mutex::new(LifecycleState::Constructed),
        monitor: RwLock::new(monitor),
        converters,
        defaults,
        next_child: AtomicUsize::new(1),
      }),
      reach: Reach::Ancestors,
    }
  }

  // --- Hierarchy ---

  /// Creates a child that falls back to this container for anything it
  /// cannot resolve itself. The child is started, stopped and disposed
  /// along with this container.
  pub fn make_child(&self) -> Result<Container> {
    self.spawn_child(Reach::Ancestors)
  }

  /// Like [`make_child`](Self::make_child), but the child only ever sees this
  /// container, never its ancestors.
  pub fn make_tiered_child(&self) -> Result<Container> {
    self.spawn_child(Reach::Local)
  }

  fn spawn_child(&self, parent_reach: Reach) -> Result<Container> {
    let number = self.inner.next_child.fetch_add(1, Ordering::Relaxed);
    let child = Self::build(
      format!("{}/child-{}", self.inner.name, number),
      self.inner.defaults,
      self.inner.converters.clone(),
      Some(Container {
        inner: self.inner.clone(),
        reach: parent_reach,
      }),
      self.monitor(),
    );
    self.add_child(&child)?;
    Ok(child)
  }

  /// Registers `child` for lifecycle cascading. Children are held weakly:
  /// dropping every handle to a child removes it.
  ///
  /// A child added to a started container keeps its own state; starting it
  /// is up to the caller.
  pub fn add_child(&self, child: &Container) -> Result<()> {
    self.permit(Transition::AddChild)?;
    let mut children = self.inner.children.write();
    children.retain(|weak| weak.strong_count() > 0);
    if !children.iter().any(|weak| weak.as_ptr() == Arc::as_ptr(&child.inner)) {
      children.push(Arc::downgrade(&child.inner));
    }
    Ok(())
  }

  /// Returns `true` if `child` was registered.
  pub fn remove_child(&self, child: &Container) -> bool {
    let mut children = self.inner.children.write();
    let before = children.len();
    children.retain(|weak| weak.strong_count() > 0 && weak.as_ptr() != Arc::as_ptr(&child.inner));
    children.len() != before
  }

  /// Live child containers in registration order.
  pub fn children(&self) -> Vec<Container> {
    self
      .inner
      .children
      .read()
      .iter()
      .filter_map(Weak::upgrade)
      .map(|inner| Container {
        inner,
        reach: Reach::Ancestors,
      })
      .collect()
  }

  pub fn parent(&self) -> Option<&Container> {
    self.inner.parent.as_ref()
  }

  /// The parent as far as this handle may reach.
  pub(crate) fn parent_view(&self) -> Option<Container> {
    match self.reach {
      Reach::Ancestors => self.inner.parent.clone(),
      Reach::Local => None,
    }
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub fn defaults(&self) -> &Defaults {
    &self.inner.defaults
  }

  /// The converters used for string-to-type conversion. Shared with every
  /// child created from this container.
  pub fn converters(&self) -> &Converters {
    &self.inner.converters
  }

  pub fn monitor(&self) -> MonitorRef {
    self.inner.monitor.read().clone()
  }

  pub(crate) fn id(&self) -> usize {
    Arc::as_ptr(&self.inner) as usize
  }

  fn describe(&self) -> String {
    format!("container '{}'", self.inner.name)
  }

  /// Fails with [`Error::Lifecycle`] if `transition` is not allowed now.
  fn permit(&self, transition: Transition) -> Result<()> {
    let state = self.state();
    match state.next(transition) {
      Some(_) => Ok(()),
      None => Err(Error::Lifecycle {
        target: self.describe(),
        current: state,
        attempted: transition,
      }),
    }
  }

  // --- Registration ---

  pub fn register(&self, registration: Registration) -> Result<()> {
    let adapter = registration.into_adapter(&self.inner.defaults);
    self.add_adapter(adapter)
  }

  /// Registers `T` by its blueprint, keyed by its type.
  pub fn add_component<T: Injectable>(&self) -> Result<()> {
    self.register(Registration::injectable::<T>())
  }

  pub fn add_component_as<T: Injectable>(&self, key: impl Into<ComponentKey>) -> Result<()> {
    self.register(Registration::injectable::<T>().key(key))
  }

  pub fn add_instance<T: Any + Send + Sync>(&self, instance: T) -> Result<()> {
    self.register(Registration::instance(instance))
  }

  /// Registers `instance` under the key `T@name`.
  pub fn add_instance_with_name<T: Any + Send + Sync>(&self, name: &str, instance: T) -> Result<()> {
    self.register(Registration::instance(instance).key(ComponentKey::qualified::<T>(name)))
  }

  pub fn add_instance_with_key<T: Any + Send + Sync>(&self, key: impl Into<ComponentKey>, instance: T) -> Result<()> {
    self.register(Registration::instance(instance).key(key))
  }

  /// Registers an already shared value, e.g. an `Arc<dyn Trait>`.
  pub fn add_shared<T: ?Sized + Any + Send + Sync>(&self, key: impl Into<ComponentKey>, value: Arc<T>) -> Result<()> {
    self.register(Registration::shared(value).key(key))
  }

  pub fn add_provider<T: ?Sized + Any + Send + Sync>(
    &self,
    key: impl Into<ComponentKey>,
    provider: Provider<T>,
  ) -> Result<()> {
    self.register(Registration::provider(provider).key(key))
  }

  /// Registers a closure that builds the component from the container. The
  /// result is cached unless the container defaults say otherwise.
  pub fn add_factory<T: ?Sized + Any + Send + Sync>(
    &self,
    key: impl Into<ComponentKey>,
    factory: impl Fn(&Container) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
  ) -> Result<()> {
    self.register(Registration::factory(factory).key(key))
  }

  /// Adds a fully built adapter chain. Refused once the container is
  /// disposed; a lifecycle component added to a started container is
  /// started right away.
  pub fn add_adapter(&self, adapter: AdapterRef) -> Result<()> {
    self.permit(Transition::AddComponent)?;
    let key = adapter.key().clone();
    if let Some(expected) = key.token() {
      if !adapter.provides(&expected) {
        return Err(Error::TypeIncompatible {
          key,
          expected,
          implementation: adapter.implementation().name(),
        });
      }
    }
    adapter.change_monitor(self.monitor());
    {
      let mut registry = self.inner.registry.write();
      if registry.index.contains_key(&key) {
        return Err(Error::DuplicateKey {
          key,
          container: self.inner.name.clone(),
        });
      }
      let slot = registry.adapters.len();
      registry.adapters.push(adapter.clone());
      registry.index.insert(key, slot);
    }
    debug!(
      container = %self.inner.name,
      key = %adapter.key(),
      adapter = %adapter.descriptor(),
      "registered component"
    );
    if self.state().is_started() && adapter.has_lifecycle() {
      adapter.start(self)?;
    }
    Ok(())
  }

  /// Removes the registration under `key`. Refused while the container is
  /// started.
  pub fn remove_component(&self, key: impl Into<ComponentKey>) -> Result<Option<AdapterRef>> {
    let key = key.into();
    self.permit(Transition::RemoveComponent)?;
    let mut registry = self.inner.registry.write();
    let Some(slot) = registry.index.get(&key).copied() else {
      return Ok(None);
    };
    let adapter = registry.adapters.remove(slot);
    registry.reindex();
    debug!(container = %self.inner.name, key = %key, "removed component");
    Ok(Some(adapter))
  }

  // --- Singleton / Transient Registration ---

  /// A lazily created, shared instance built by `factory` at most once.
  pub fn add_singleton<T: Any + Send + Sync>(&self, factory: impl Fn() -> T + Send + Sync + 'static) -> Result<()> {
    self.register(Self::singleton(ComponentKey::of::<T>(), move || Arc::new(factory())))
  }

  pub fn add_singleton_with_name<T: Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn() -> T + Send + Sync + 'static,
  ) -> Result<()> {
    self.register(Self::singleton(ComponentKey::qualified::<T>(name), move || Arc::new(factory())))
  }

  /// A new instance built by `factory` on every request.
  pub fn add_transient<T: Any + Send + Sync>(&self, factory: impl Fn() -> T + Send + Sync + 'static) -> Result<()> {
    self.register(Self::transient(ComponentKey::of::<T>(), factory))
  }

  pub fn add_transient_with_name<T: Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn() -> T + Send + Sync + 'static,
  ) -> Result<()> {
    self.register(Self::transient(ComponentKey::qualified::<T>(name), factory))
  }

  /// A lazily created trait object, keyed by the trait.
  pub fn add_singleton_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    factory: impl Fn() -> Arc<I> + Send + Sync + 'static,
  ) -> Result<()> {
    self.register(Self::singleton(ComponentKey::of::<I>(), factory))
  }

  pub fn add_singleton_trait_with_name<I: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn() -> Arc<I> + Send + Sync + 'static,
  ) -> Result<()> {
    self.register(Self::singleton(ComponentKey::qualified::<I>(name), factory))
  }

  fn singleton<T: ?Sized + Any + Send + Sync>(
    key: ComponentKey,
    factory: impl Fn() -> Arc<T> + Send + Sync + 'static,
  ) -> Registration {
    Registration::factory::<T>(move |_: &Container| Ok(factory()))
      .key(key)
      .cached(true)
      .locked(true)
  }

  fn transient<T: Any + Send + Sync>(key: ComponentKey, factory: impl Fn() -> T + Send + Sync + 'static) -> Registration {
    Registration::factory::<T>(move |_: &Container| Ok(Arc::new(factory())))
      .key(key)
      .cached(false)
  }

  // --- Queries ---

  /// The adapter under `key`, here or in a reachable ancestor.
  pub fn adapter(&self, key: &ComponentKey) -> Option<AdapterRef> {
    self.lookup(key).map(|(_, adapter)| adapter)
  }

  pub fn local_adapter(&self, key: &ComponentKey) -> Option<AdapterRef> {
    self.inner.registry.read().get(key)
  }

  /// Local adapters in registration order.
  pub fn adapters(&self) -> Vec<AdapterRef> {
    self.inner.registry.read().adapters.clone()
  }

  /// Local adapters providing `token`, in registration order.
  pub fn adapters_of(&self, token: &TypeToken) -> Vec<AdapterRef> {
    self
      .inner
      .registry
      .read()
      .adapters
      .iter()
      .filter(|adapter| adapter.provides(token))
      .cloned()
      .collect()
  }

  /// Finds `key` and the container it is registered in.
  pub(crate) fn lookup(&self, key: &ComponentKey) -> Option<(Container, AdapterRef)> {
    if let Some(adapter) = self.local_adapter(key) {
      return Some((self.clone(), adapter));
    }
    self.parent_view().and_then(|parent| parent.lookup(key))
  }

  /// Local adapters that could satisfy `request`, minus the requester.
  pub(crate) fn candidates(&self, token: &TypeToken, request: &ParameterRequest<'_>) -> Vec<AdapterRef> {
    let id = self.id();
    self
      .inner
      .registry
      .read()
      .adapters
      .iter()
      .filter(|adapter| adapter.provides(token) && !request.excludes(id, adapter.key()))
      .cloned()
      .collect()
  }

  /// Produces an instance from `adapter` (registered here) viewed as `into`.
  pub(crate) fn instance_of(&self, adapter: &dyn ComponentAdapter, into: &TypeToken) -> Result<Instance> {
    let span = debug_span!("resolve", container = %self.inner.name, key = %adapter.key());
    let _enter = span.enter();
    let instance = adapter.get_instance(self)?;
    let implementation = instance.token().name();
    cast_instance(adapter, instance, into).ok_or_else(|| Error::TypeIncompatible {
      key: adapter.key().clone(),
      expected: *into,
      implementation,
    })
  }

  /// The raw instance registered under `key`, or `None` if nothing is.
  pub fn get_component(&self, key: impl Into<ComponentKey>) -> Result<Option<Instance>> {
    let key = key.into();
    match self.lookup(&key) {
      Some((owner, adapter)) => {
        let span = debug_span!("resolve", container = %owner.name(), key = %key);
        let _enter = span.enter();
        adapter.get_instance(&owner).map(Some)
      }
      None => {
        self.monitor().no_component_found(&self.inner.name, &key);
        Ok(None)
      }
    }
  }

  /// Resolves a `T`: by type when `name` is `None`, otherwise the component
  /// registered as `T@name`.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self, name: Option<&str>) -> Result<Option<Arc<T>>> {
    match name {
      Some(name) => self.get_qualified::<T>(name),
      None => self.get_by_type::<T>(),
    }
  }

  fn get_by_type<T: ?Sized + Any + Send + Sync>(&self) -> Result<Option<Arc<T>>> {
    let spec = ParameterSpec::of::<T>();
    let request = ParameterRequest::new(&spec).use_names(self.inner.defaults.use_names);
    let resolution = resolve_single(self, &request)?;
    if !resolution.is_resolved() {
      self.monitor().no_component_found(&self.inner.name, &ComponentKey::of::<T>());
      return Ok(None);
    }
    match resolution.instantiate()? {
      Argument::Value(instance) => Ok(instance.downcast::<T>()),
      _ => Ok(None),
    }
  }

  pub fn get_qualified<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
    self.get_by_key::<T>(ComponentKey::qualified::<T>(name))
  }

  /// The component under `key`, viewed as `T`.
  pub fn get_by_key<T: ?Sized + Any + Send + Sync>(&self, key: impl Into<ComponentKey>) -> Result<Option<Arc<T>>> {
    let key = key.into();
    let Some((owner, adapter)) = self.lookup(&key) else {
      self.monitor().no_component_found(&self.inner.name, &key);
      return Ok(None);
    };
    let expected = TypeToken::of::<T>();
    if !adapter.provides(&expected) {
      return Err(Error::TypeIncompatible {
        key,
        expected,
        implementation: adapter.implementation().name(),
      });
    }
    let instance = owner.instance_of(adapter.as_ref(), &expected)?;
    Ok(instance.downcast::<T>())
  }

  /// Every local component providing `T`, in registration order.
  pub fn get_all<T: ?Sized + Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>> {
    let expected = TypeToken::of::<T>();
    self
      .adapters_of(&expected)
      .iter()
      .map(|adapter| {
        let instance = self.instance_of(adapter.as_ref(), &expected)?;
        instance.downcast::<T>().ok_or_else(|| Error::TypeIncompatible {
          key: adapter.key().clone(),
          expected,
          implementation: instance.token().name(),
        })
      })
      .collect()
  }

  // --- Lifecycle ---

  pub fn state(&self) -> LifecycleState {
    *self.inner.state.lock()
  }

  /// Starts lifecycle components in registration order, then child
  /// containers.
  pub fn start(&self) -> Result<()> {
    advance(&self.inner.state, || self.describe(), Transition::Start)?;
    debug!(container = %self.inner.name, "starting container");
    for adapter in self.adapters() {
      if adapter.has_lifecycle() {
        adapter.start(self)?;
      }
    }
    self.cascade(Transition::Start, Container::start)
  }

  pub fn stop(&self) -> Result<()> {
    advance(&self.inner.state, || self.describe(), Transition::Stop)?;
    debug!(container = %self.inner.name, "stopping container");
    for adapter in self.adapters() {
      if adapter.has_lifecycle() {
        adapter.stop(self)?;
      }
    }
    self.cascade(Transition::Stop, Container::stop)
  }

  /// Disposes every component and drops cached instances. Terminal.
  pub fn dispose(&self) -> Result<()> {
    advance(&self.inner.state, || self.describe(), Transition::Dispose)?;
    debug!(container = %self.inner.name, "disposing container");
    for adapter in self.adapters() {
      adapter.dispose(self)?;
    }
    self.cascade(Transition::Dispose, Container::dispose)
  }

  /// Applies `apply` to every live child the transition is valid for.
  fn cascade(&self, transition: Transition, apply: fn(&Container) -> Result<()>) -> Result<()> {
    for child in self.children() {
      if child.state().next(transition).is_some() {
        apply(&child)?;
      }
    }
    Ok(())
  }

  /// Replaces the monitor here, on every adapter and in every child.
  pub fn change_monitor(&self, monitor: MonitorRef) {
    *self.inner.monitor.write() = monitor.clone();
    for adapter in self.adapters() {
      adapter.change_monitor(monitor.clone());
    }
    for child in self.children() {
      child.change_monitor(monitor.clone());
    }
  }

  /// Walks this container, its adapters and their parameters, then the
  /// children.
  pub fn accept(&self, visitor: &mut dyn ContainerVisitor) {
    if !visitor.visit_container(self) {
      return;
    }
    for adapter in self.adapters() {
      visitor.visit_adapter(self, adapter.as_ref());
      for parameter in adapter.parameters() {
        visitor.visit_parameter(self, adapter.as_ref(), parameter.as_ref());
      }
    }
    for child in self.children() {
      child.accept(visitor);
    }
  }

  /// Checks every registration can be satisfied, without instantiating
  /// anything. All problems are reported together.
  pub fn verify(&self) -> Result<()> {
    let mut visitor = VerifyingVisitor::new();
    self.accept(&mut visitor);
    visitor.finish()
  }
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("name", &self.inner.name)
      .field("state", &self.state())
      .field("components", &self.inner.registry.read().adapters.len())
      .field("parent", &self.inner.parent.as_ref().map(Container::name))
      .field("tiered", &self.inner.parent.as_ref().is_some_and(|parent| parent.reach == Reach::Local))
      .finish()
  }
}
