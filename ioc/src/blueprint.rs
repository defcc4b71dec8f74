//! Blueprints describe how a type is constructed and injected.
//!
//! Rust has no runtime reflection, so the members the container may call are
//! declared up front: constructors, fields, setters and injection methods,
//! each with the parameters it needs. The container decides how to satisfy
//! those parameters; the blueprint only says what they are and how to invoke
//! the member once they are resolved.

use crate::error::{BoxError, Error, Result};
use crate::instance::{Facet, Instance};
use crate::key::{ComponentKey, TypeToken};
use crate::lifecycle::{Lifecycle, LifecycleHook};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// The shape of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  /// One component of the parameter type.
  Single,
  /// Every component providing the element type, in registration order.
  List,
  /// Like `List`, paired with each component's key.
  Map,
}

/// A declared constructor, field, setter or method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
  token: TypeToken,
  shape: Shape,
  name: Option<String>,
  binding: Option<String>,
}

impl ParameterSpec {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      token: TypeToken::of::<T>(),
      shape: Shape::Single,
      name: None,
      binding: None,
    }
  }

  /// A parameter receiving every component that provides `T`.
  pub fn list_of<T: ?Sized + Any>() -> Self {
    Self {
      shape: Shape::List,
      ..Self::of::<T>()
    }
  }

  /// A parameter receiving every component that provides `T`, with its key.
  pub fn map_of<T: ?Sized + Any>() -> Self {
    Self {
      shape: Shape::Map,
      ..Self::of::<T>()
    }
  }

  /// Sets the name hint used for disambiguation and string conversion.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Binds the parameter to the `Qualified { T, qualifier }` registration.
  pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
    self.binding = Some(qualifier.into());
    self
  }

  /// The parameter type, or the element type for collection shapes.
  pub fn token(&self) -> TypeToken {
    self.token
  }

  pub fn shape(&self) -> Shape {
    self.shape
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn binding(&self) -> Option<&str> {
    self.binding.as_deref()
  }

  fn or_named(mut self, name: &str) -> Self {
    if self.name.is_none() {
      self.name = Some(name.to_owned());
    }
    self
  }
}

impl fmt::Display for ParameterSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.shape {
      Shape::Single => write!(f, "{}", self.token)?,
      Shape::List => write!(f, "[{}]", self.token)?,
      Shape::Map => write!(f, "{{key: {}}}", self.token)?,
    }
    if let Some(name) = &self.name {
      write!(f, " {}", name)?;
    }
    Ok(())
  }
}

/// A resolved argument, ready to be handed to a member.
#[derive(Debug, Clone)]
pub enum Argument {
  Null,
  Value(Instance),
  List(Vec<Instance>),
  Map(Vec<(ComponentKey, Instance)>),
}

/// The resolved arguments of one member invocation.
#[derive(Debug)]
pub struct Arguments {
  member: String,
  values: Vec<Argument>,
}

impl Arguments {
  pub fn new(member: impl Into<String>, values: Vec<Argument>) -> Self {
    Self {
      member: member.into(),
      values,
    }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn argument(&self, index: usize) -> Option<&Argument> {
    self.values.get(index)
  }

  /// The component at `index`.
  pub fn component<T: ?Sized + Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    match self.values.get(index) {
      Some(Argument::Value(instance)) => instance.downcast::<T>().ok_or_else(|| self.mismatch::<T>(index)),
      _ => Err(self.mismatch::<T>(index)),
    }
  }

  /// The component at `index`, or `None` for a null argument.
  pub fn optional<T: ?Sized + Any + Send + Sync>(&self, index: usize) -> Result<Option<Arc<T>>> {
    match self.values.get(index) {
      Some(Argument::Null) => Ok(None),
      _ => self.component::<T>(index).map(Some),
    }
  }

  /// A clone of the value at `index`, for plain values such as numbers.
  pub fn value<T: Any + Send + Sync + Clone>(&self, index: usize) -> Result<T> {
    self.component::<T>(index).map(|value| (*value).clone())
  }

  pub fn list<T: ?Sized + Any + Send + Sync>(&self, index: usize) -> Result<Vec<Arc<T>>> {
    match self.values.get(index) {
      Some(Argument::List(items)) => items
        .iter()
        .map(|item| item.downcast::<T>().ok_or_else(|| self.mismatch::<T>(index)))
        .collect(),
      _ => Err(self.mismatch::<Vec<Arc<T>>>(index)),
    }
  }

  pub fn map<T: ?Sized + Any + Send + Sync>(&self, index: usize) -> Result<Vec<(ComponentKey, Arc<T>)>> {
    match self.values.get(index) {
      Some(Argument::Map(entries)) => entries
        .iter()
        .map(|(key, item)| {
          item
            .downcast::<T>()
            .map(|value| (key.clone(), value))
            .ok_or_else(|| self.mismatch::<T>(index))
        })
        .collect(),
      _ => Err(self.mismatch::<Vec<(ComponentKey, Arc<T>)>>(index)),
    }
  }

  fn mismatch<T: ?Sized>(&self, index: usize) -> Error {
    Error::ArgumentMismatch {
      member: self.member.clone(),
      index,
      expected: type_name::<T>(),
    }
  }
}

type ConstructFn<T> = Arc<dyn Fn(&Arguments) -> Result<T, BoxError> + Send + Sync>;
type InjectFn<T> = Arc<dyn Fn(&mut T, &Arguments) -> Result<(), BoxError> + Send + Sync>;

/// A way to build a `T` from resolved arguments.
pub struct Constructor<T> {
  name: String,
  params: Vec<ParameterSpec>,
  invoke: ConstructFn<T>,
}

impl<T> Constructor<T> {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn params(&self) -> &[ParameterSpec] {
    &self.params
  }

  pub(crate) fn invoke(&self, args: &Arguments) -> Result<T, BoxError> {
    (self.invoke)(args)
  }
}

impl<T> Clone for Constructor<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      params: self.params.clone(),
      invoke: self.invoke.clone(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
  Field,
  Setter,
  Method,
}

/// A field, setter or injection method applied to an already built `T`.
pub struct Member<T> {
  name: String,
  kind: MemberKind,
  params: Vec<ParameterSpec>,
  invoke: InjectFn<T>,
}

impl<T> Member<T> {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> MemberKind {
    self.kind
  }

  pub fn params(&self) -> &[ParameterSpec] {
    &self.params
  }

  pub(crate) fn invoke(&self, target: &mut T, args: &Arguments) -> Result<(), BoxError> {
    (self.invoke)(target, args)
  }
}

impl<T> Clone for Member<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      kind: self.kind,
      params: self.params.clone(),
      invoke: self.invoke.clone(),
    }
  }
}

/// Everything the container needs to know to construct and inject a `T`.
///
/// ```
/// use std::sync::Arc;
/// use trellis_ioc::{Blueprint, ParameterSpec};
///
/// struct Database { url: String }
/// struct Repository { db: Arc<Database> }
///
/// let blueprint = Blueprint::<Repository>::new().constructor(
///   "new",
///   vec![ParameterSpec::of::<Database>()],
///   |args| Ok(Repository { db: args.component::<Database>(0)? }),
/// );
/// assert_eq!(blueprint.constructors().len(), 1);
/// ```
pub struct Blueprint<T> {
  constructors: Vec<Constructor<T>>,
  members: Vec<Member<T>>,
  facets: Vec<Facet>,
  lifecycle: Option<LifecycleHook>,
}

impl<T: Any + Send + Sync> Blueprint<T> {
  pub fn new() -> Self {
    Self {
      constructors: Vec::new(),
      members: Vec::new(),
      facets: Vec::new(),
      lifecycle: None,
    }
  }

  pub fn constructor(
    mut self,
    name: &str,
    params: Vec<ParameterSpec>,
    invoke: impl Fn(&Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
  ) -> Self {
    self.constructors.push(Constructor {
      name: name.to_owned(),
      params,
      invoke: Arc::new(invoke),
    });
    self
  }

  /// A zero-argument constructor.
  pub fn default_constructor(self, invoke: impl Fn() -> T + Send + Sync + 'static) -> Self {
    self.constructor("default", Vec::new(), move |_| Ok(invoke()))
  }

  /// A field assigned after construction. The field name is the parameter's
  /// name hint unless the parameter already has one.
  pub fn field(
    mut self,
    name: &str,
    spec: ParameterSpec,
    assign: impl Fn(&mut T, &Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
  ) -> Self {
    self.members.push(Member {
      name: name.to_owned(),
      kind: MemberKind::Field,
      params: vec![spec.or_named(name)],
      invoke: Arc::new(assign),
    });
    self
  }

  /// A setter called after construction. `set_url` gets the name hint `url`.
  pub fn setter(
    mut self,
    name: &str,
    spec: ParameterSpec,
    set: impl Fn(&mut T, &Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
  ) -> Self {
    let property = name.strip_prefix("set_").unwrap_or(name);
    self.members.push(Member {
      name: name.to_owned(),
      kind: MemberKind::Setter,
      params: vec![spec.or_named(property)],
      invoke: Arc::new(set),
    });
    self
  }

  /// An injection method called after construction with all its arguments.
  pub fn method(
    mut self,
    name: &str,
    params: Vec<ParameterSpec>,
    invoke: impl Fn(&mut T, &Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
  ) -> Self {
    self.members.push(Member {
      name: name.to_owned(),
      kind: MemberKind::Method,
      params,
      invoke: Arc::new(invoke),
    });
    self
  }

  /// Declares that `T` can be viewed as `F`, e.g. a trait object it implements.
  pub fn facet<F: ?Sized + Any + Send + Sync>(
    mut self,
    cast: impl Fn(Arc<T>) -> Arc<F> + Send + Sync + 'static,
  ) -> Self {
    self.facets.push(Facet::new(cast));
    self
  }

  /// Lets the container drive `T`'s start/stop/dispose callbacks.
  pub fn with_lifecycle(mut self) -> Self
  where
    T: Lifecycle,
  {
    self.lifecycle = Some(LifecycleHook::of::<T>());
    self
  }

  pub fn implementation(&self) -> TypeToken {
    TypeToken::of::<T>()
  }

  pub fn constructors(&self) -> &[Constructor<T>] {
    &self.constructors
  }

  pub fn members(&self) -> &[Member<T>] {
    &self.members
  }

  pub fn facets(&self) -> &[Facet] {
    &self.facets
  }

  pub fn lifecycle(&self) -> Option<&LifecycleHook> {
    self.lifecycle.as_ref()
  }

  pub(crate) fn zero_arg_constructor(&self) -> Result<&Constructor<T>> {
    self
      .constructors
      .iter()
      .find(|ctor| ctor.params.is_empty())
      .ok_or(Error::NoDefaultConstructor {
        implementation: type_name::<T>(),
      })
  }
}

impl<T: Any + Send + Sync> Default for Blueprint<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for Blueprint<T> {
  fn clone(&self) -> Self {
    Self {
      constructors: self.constructors.clone(),
      members: self.members.clone(),
      facets: self.facets.clone(),
      lifecycle: self.lifecycle.clone(),
    }
  }
}

/// Types that describe their own blueprint, the static stand-in for
/// reflective member discovery.
pub trait Injectable: Any + Send + Sync + Sized {
  fn blueprint() -> Blueprint<Self>;
}
