//! Parameter resolution: deciding how one declared argument is satisfied.
//!
//! A [`Parameter`] turns a [`ParameterRequest`] into a [`Resolution`]. The
//! resolution says whether the argument can be satisfied at all and, if so,
//! produces it on demand. Resolving never instantiates anything; only
//! [`Resolution::instantiate`] does.
//!
//! Single components are chosen in this order:
//!
//! 1. a key given when the parameter was built,
//! 2. the binding qualifier declared on the parameter,
//! 3. the unique local component providing the type,
//! 4. the same search in the parent (as far as the container may reach),
//! 5. among several local candidates: the one whose key matches the name
//!    hint (with `use_names`), then the single one keyed by the type itself,
//! 6. a `String` component named like the hint, converted to the type.
//!
//! Anything still open is unresolved; several equal candidates are an
//! [`Error::Ambiguous`] listing all of them.

use crate::adapter::AdapterRef;
use crate::blueprint::{Argument, ParameterSpec, Shape};
use crate::container::Container;
use crate::error::{Candidate, Error, Result};
use crate::instance::Instance;
use crate::key::{ComponentKey, TypeToken};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub type ParameterRef = Arc<dyn Parameter>;

type KeyFilter = Arc<dyn Fn(&ComponentKey) -> bool + Send + Sync>;

/// Who is asking for a parameter. Used to keep a component from being
/// injected into itself.
#[derive(Debug, Clone, Copy)]
struct Requester<'a> {
  container: usize,
  key: &'a ComponentKey,
  implementation: &'static str,
}

/// One argument the container has to satisfy.
#[derive(Debug, Clone, Copy)]
pub struct ParameterRequest<'a> {
  spec: &'a ParameterSpec,
  requester: Option<Requester<'a>>,
  use_names: bool,
}

impl<'a> ParameterRequest<'a> {
  pub fn new(spec: &'a ParameterSpec) -> Self {
    Self {
      spec,
      requester: None,
      use_names: false,
    }
  }

  /// Marks the request as coming from the component `key` registered in
  /// `container`; that component is excluded from the candidates.
  pub fn requested_by(mut self, container: &Container, key: &'a ComponentKey, implementation: &'static str) -> Self {
    self.requester = Some(Requester {
      container: container.id(),
      key,
      implementation,
    });
    self
  }

  pub fn use_names(mut self, use_names: bool) -> Self {
    self.use_names = use_names;
    self
  }

  pub fn spec(&self) -> &'a ParameterSpec {
    self.spec
  }

  pub fn implementation(&self) -> &'static str {
    self.requester.map_or("<container>", |requester| requester.implementation)
  }

  pub(crate) fn excludes(&self, container: usize, key: &ComponentKey) -> bool {
    self
      .requester
      .is_some_and(|requester| requester.container == container && requester.key == key)
  }

  fn unsatisfiable(&self, container: &Container) -> Error {
    Error::Unsatisfiable {
      implementation: self.implementation(),
      unsatisfied: vec![self.spec.token()],
      container: container.name().to_owned(),
    }
  }
}

/// Decides how one argument is satisfied.
pub trait Parameter: Send + Sync + fmt::Debug {
  fn resolve(&self, container: &Container, request: &ParameterRequest<'_>) -> Result<Resolution>;

  /// Fails if the parameter cannot be satisfied, or if a component it
  /// resolves to cannot be.
  fn verify(&self, container: &Container, request: &ParameterRequest<'_>) -> Result<()> {
    let resolution = self.resolve(container, request)?;
    if !resolution.is_resolved() {
      return Err(request.unsatisfiable(container));
    }
    resolution.verify()
  }

  /// `true` for the marker that pins a component to its zero-argument
  /// constructor.
  fn pins_default_constructor(&self) -> bool {
    false
  }
}

enum Source {
  Unresolved,
  Value(Argument),
  Component {
    owner: Container,
    adapter: AdapterRef,
    into: TypeToken,
  },
  Converted {
    owner: Container,
    adapter: AdapterRef,
    converters: Container,
    into: TypeToken,
  },
  Aggregate {
    shape: Shape,
    into: TypeToken,
    items: Vec<(Container, AdapterRef)>,
  },
}

/// The outcome of resolving a parameter.
pub struct Resolution {
  source: Source,
}

impl Resolution {
  pub fn unresolved() -> Self {
    Self {
      source: Source::Unresolved,
    }
  }

  pub fn value(argument: Argument) -> Self {
    Self {
      source: Source::Value(argument),
    }
  }

  pub(crate) fn component(owner: Container, adapter: AdapterRef, into: TypeToken) -> Self {
    Self {
      source: Source::Component { owner, adapter, into },
    }
  }

  pub fn is_resolved(&self) -> bool {
    !matches!(self.source, Source::Unresolved)
  }

  /// The adapter a single-component resolution settled on.
  pub fn adapter(&self) -> Option<&AdapterRef> {
    match &self.source {
      Source::Component { adapter, .. } | Source::Converted { adapter, .. } => Some(adapter),
      _ => None,
    }
  }

  /// Verifies the adapters this resolution would instantiate.
  pub fn verify(&self) -> Result<()> {
    match &self.source {
      Source::Unresolved | Source::Value(_) => Ok(()),
      Source::Component { owner, adapter, .. } | Source::Converted { owner, adapter, .. } => adapter.verify(owner),
      Source::Aggregate { items, .. } => items.iter().try_for_each(|(owner, adapter)| adapter.verify(owner)),
    }
  }

  /// Produces the argument. Unresolved resolutions yield a null argument.
  pub fn instantiate(&self) -> Result<Argument> {
    match &self.source {
      Source::Unresolved => Ok(Argument::Null),
      Source::Value(argument) => Ok(argument.clone()),
      Source::Component { owner, adapter, into } => {
        owner.instance_of(adapter.as_ref(), into).map(Argument::Value)
      }
      Source::Converted {
        owner,
        adapter,
        converters,
        into,
      } => {
        let instance = adapter.get_instance(owner)?;
        let text = instance.downcast::<String>().ok_or_else(|| Error::TypeIncompatible {
          key: adapter.key().clone(),
          expected: TypeToken::of::<String>(),
          implementation: instance.token().name(),
        })?;
        converters.converters().convert(into, &text).map(Argument::Value)
      }
      Source::Aggregate { shape, into, items } => match shape {
        Shape::Map => items
          .iter()
          .map(|(owner, adapter)| Ok((adapter.key().clone(), owner.instance_of(adapter.as_ref(), into)?)))
          .collect::<Result<Vec<_>>>()
          .map(Argument::Map),
        Shape::Single | Shape::List => items
          .iter()
          .map(|(owner, adapter)| owner.instance_of(adapter.as_ref(), into))
          .collect::<Result<Vec<_>>>()
          .map(Argument::List),
      },
    }
  }
}

impl fmt::Debug for Resolution {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.source {
      Source::Unresolved => f.write_str("Unresolved"),
      Source::Value(argument) => write!(f, "Value({:?})", argument),
      Source::Component { adapter, into, .. } => write!(f, "Component({} as {})", adapter.key(), into),
      Source::Converted { adapter, into, .. } => write!(f, "Converted({} to {})", adapter.key(), into),
      Source::Aggregate { into, items, .. } => write!(f, "Aggregate({} x {})", items.len(), into),
    }
  }
}

// --- Parameter kinds ---

/// Resolves a component by type, or by a fixed key.
///
/// This is the parameter used for every declared argument the registration
/// does not pin explicitly. Collection-shaped specs aggregate all matching
/// components; an empty aggregate is unresolved unless `allow_empty` was set.
#[derive(Debug, Clone, Default)]
pub struct ComponentParameter {
  key: Option<ComponentKey>,
  allow_empty: bool,
}

impl ComponentParameter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Always resolves the component registered under `key`.
  pub fn key(key: impl Into<ComponentKey>) -> Self {
    Self {
      key: Some(key.into()),
      allow_empty: false,
    }
  }

  /// Collection-shaped specs resolve to an empty collection instead of
  /// failing when nothing matches.
  pub fn allow_empty() -> Self {
    Self {
      key: None,
      allow_empty: true,
    }
  }

  pub(crate) fn with_empty_collections(allow_empty: bool) -> Self {
    Self { key: None, allow_empty }
  }
}

impl Parameter for ComponentParameter {
  fn resolve(&self, container: &Container, request: &ParameterRequest<'_>) -> Result<Resolution> {
    if let Some(key) = &self.key {
      return Ok(by_key(container, container, key, request.spec().token()));
    }
    match request.spec().shape() {
      Shape::Single => resolve_single(container, request),
      shape => Ok(aggregate(container, request, shape, self.allow_empty, None)),
    }
  }
}

/// Aggregates every component providing the element type of the parameter, optionally
/// restricted to keys accepted by a filter.
#[derive(Clone, Default)]
pub struct CollectionParameter {
  allow_empty: bool,
  filter: Option<KeyFilter>,
}

impl CollectionParameter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn allow_empty(mut self, allow_empty: bool) -> Self {
    self.allow_empty = allow_empty;
    self
  }

  pub fn key_filter(mut self, filter: impl Fn(&ComponentKey) -> bool + Send + Sync + 'static) -> Self {
    self.filter = Some(Arc::new(filter));
    self
  }
}

impl fmt::Debug for CollectionParameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CollectionParameter")
      .field("allow_empty", &self.allow_empty)
      .field("filtered", &self.filter.is_some())
      .finish()
  }
}

impl Parameter for CollectionParameter {
  fn resolve(&self, container: &Container, request: &ParameterRequest<'_>) -> Result<Resolution> {
    let shape = match request.spec().shape() {
      Shape::Map => Shape::Map,
      Shape::Single | Shape::List => Shape::List,
    };
    Ok(aggregate(container, request, shape, self.allow_empty, self.filter.as_ref()))
  }
}

/// A fixed value.
///
/// A `String` constant given to a parameter of another type is converted
/// with the container's converters.
#[derive(Clone)]
pub struct ConstantParameter {
  value: Instance,
}

impl ConstantParameter {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self {
      value: Instance::new(value),
    }
  }

  pub fn from_instance(value: Instance) -> Self {
    Self { value }
  }
}

impl fmt::Debug for ConstantParameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ConstantParameter({})", self.value.token())
  }
}

impl Parameter for ConstantParameter {
  fn resolve(&self, container: &Container, request: &ParameterRequest<'_>) -> Result<Resolution> {
    let expected = request.spec().token();
    if self.value.token() == expected {
      return Ok(Resolution::value(Argument::Value(self.value.clone())));
    }
    let text = self
      .value
      .downcast::<String>()
      .map(|text| text.as_str().to_owned())
      .or_else(|| self.value.downcast::<&'static str>().map(|text| (*text).to_owned()));
    match text {
      Some(text) if container.converters().can_convert(&expected) => container
        .converters()
        .convert(&expected, &text)
        .map(|converted| Resolution::value(Argument::Value(converted))),
      _ => Ok(Resolution::unresolved()),
    }
  }
}

/// Always resolves to a null argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullParameter;

impl Parameter for NullParameter {
  fn resolve(&self, _container: &Container, _request: &ParameterRequest<'_>) -> Result<Resolution> {
    Ok(Resolution::value(Argument::Null))
  }
}

/// Pins a registration to its zero-argument constructor. Resolves nothing on
/// its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstructorParameter;

impl Parameter for DefaultConstructorParameter {
  fn resolve(&self, _container: &Container, _request: &ParameterRequest<'_>) -> Result<Resolution> {
    Ok(Resolution::unresolved())
  }

  fn pins_default_constructor(&self) -> bool {
    true
  }
}

// --- Resolution algorithm ---

/// Looks `key` up from `container` and checks the result can be used as
/// `expected`. Converters come from `requester`.
fn by_key(container: &Container, requester: &Container, key: &ComponentKey, expected: TypeToken) -> Resolution {
  match container.lookup(key) {
    Some((owner, adapter)) if adapter.provides(&expected) => Resolution::component(owner, adapter, expected),
    Some((owner, adapter))
      if adapter.provides(&TypeToken::of::<String>()) && requester.converters().can_convert(&expected) =>
    {
      Resolution {
        source: Source::Converted {
          owner,
          adapter,
          converters: requester.clone(),
          into: expected,
        },
      }
    }
    _ => Resolution::unresolved(),
  }
}

/// Resolves a single component for `request` from `container`.
pub(crate) fn resolve_single(container: &Container, request: &ParameterRequest<'_>) -> Result<Resolution> {
  let spec = request.spec();
  let expected = spec.token();

  if let Some(qualifier) = spec.binding() {
    let key = ComponentKey::Qualified {
      token: expected,
      qualifier: qualifier.to_owned(),
    };
    return Ok(by_key(container, container, &key, expected));
  }

  let found = find_by_type(container, request)?;
  if found.is_resolved() {
    return Ok(found);
  }

  if request.use_names {
    if let Some(name) = spec.name() {
      if container.converters().can_convert(&expected) {
        return Ok(by_key(container, container, &ComponentKey::named(name), expected));
      }
    }
  }
  Ok(Resolution::unresolved())
}

fn find_by_type(container: &Container, request: &ParameterRequest<'_>) -> Result<Resolution> {
  let expected = request.spec().token();
  let mut candidates = container.candidates(&expected, request);
  match candidates.len() {
    0 => match container.parent_view() {
      Some(parent) => find_by_type(&parent, request),
      None => Ok(Resolution::unresolved()),
    },
    1 => {
      let adapter = candidates.remove(0);
      Ok(Resolution::component(container.clone(), adapter, expected))
    }
    _ => disambiguate(container, request, candidates),
  }
}

fn disambiguate(container: &Container, request: &ParameterRequest<'_>, candidates: Vec<AdapterRef>) -> Result<Resolution> {
  let expected = request.spec().token();

  if request.use_names {
    if let Some(name) = request.spec().name() {
      if let Some(adapter) = candidates.iter().find(|adapter| adapter.key().name() == Some(name)) {
        return Ok(Resolution::component(container.clone(), adapter.clone(), expected));
      }
    }
  }

  // Convention: among several candidates, the single one registered under the
  // type itself is the default.
  let type_key = ComponentKey::Type(expected);
  let mut keyed_by_type = candidates.iter().filter(|adapter| *adapter.key() == type_key);
  if let (Some(adapter), None) = (keyed_by_type.next(), keyed_by_type.next()) {
    return Ok(Resolution::component(container.clone(), adapter.clone(), expected));
  }

  Err(Error::Ambiguous {
    expected,
    candidates: candidates
      .iter()
      .map(|adapter| Candidate {
        key: adapter.key().clone(),
        implementation: adapter.implementation().name(),
      })
      .collect(),
    container: container.name().to_owned(),
  })
}

fn aggregate(
  container: &Container,
  request: &ParameterRequest<'_>,
  shape: Shape,
  allow_empty: bool,
  filter: Option<&KeyFilter>,
) -> Resolution {
  let into = request.spec().token();
  let mut items = Vec::new();
  gather(container, request, &into, filter, &mut items);
  if items.is_empty() && !allow_empty {
    return Resolution::unresolved();
  }
  Resolution {
    source: Source::Aggregate { shape, into, items },
  }
}

/// Ancestors first, then local components in registration order. A local key
/// hides the same key further up.
fn gather(
  container: &Container,
  request: &ParameterRequest<'_>,
  into: &TypeToken,
  filter: Option<&KeyFilter>,
  items: &mut Vec<(Container, AdapterRef)>,
) {
  if let Some(parent) = container.parent_view() {
    gather(&parent, request, into, filter, items);
  }
  let local: Vec<AdapterRef> = container
    .candidates(into, request)
    .into_iter()
    .filter(|adapter| filter.map_or(true, |accept| accept(adapter.key())))
    .collect();
  items.retain(|(_, inherited)| !local.iter().any(|adapter| adapter.key() == inherited.key()));
  items.extend(local.into_iter().map(|adapter| (container.clone(), adapter)));
}
