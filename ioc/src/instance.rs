//! Type-erased component instances and the facets an implementation exposes.

use crate::key::TypeToken;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased component instance.
///
/// Always wraps an `Arc<T>` for the type `T` it was produced as, so cloning is
/// cheap and every clone points at the same allocation. Casting through a
/// [`Facet`] keeps that allocation, which is what makes reference identity
/// observable across trait-object views.
#[derive(Clone)]
pub struct Instance {
  value: Arc<dyn Any + Send + Sync>,
  token: TypeToken,
  addr: usize,
}

impl Instance {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  pub fn from_arc<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    let addr = Arc::as_ptr(&value).cast::<()>() as usize;
    Self {
      value: Arc::new(value),
      token: TypeToken::of::<T>(),
      addr,
    }
  }

  pub fn token(&self) -> TypeToken {
    self.token
  }

  pub fn is<T: ?Sized + Any>(&self) -> bool {
    self.token.is::<T>()
  }

  /// Recovers the typed handle. Returns `None` if the instance was produced as
  /// a different type.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.value.downcast_ref::<Arc<T>>().cloned()
  }

  /// `true` if both instances point at the same allocation.
  pub fn same_as(&self, other: &Instance) -> bool {
    self.addr == other.addr
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Instance({} @ {:#x})", self.token, self.addr)
  }
}

type CastFn = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// A declared view of an implementation as another type, usually a trait
/// object: `Arc<Impl>` to `Arc<dyn Trait>`.
///
/// An adapter provides its implementation type and the type of every facet it
/// declares; type-based lookups match against both.
#[derive(Clone)]
pub struct Facet {
  token: TypeToken,
  cast: CastFn,
}

impl Facet {
  pub fn new<S, T, F>(cast: F) -> Self
  where
    S: ?Sized + Any + Send + Sync,
    T: ?Sized + Any + Send + Sync,
    F: Fn(Arc<S>) -> Arc<T> + Send + Sync + 'static,
  {
    Self {
      token: TypeToken::of::<T>(),
      cast: Arc::new(move |instance: &Instance| {
        instance
          .downcast::<S>()
          .map(|source| Instance::from_arc(cast(source)))
      }),
    }
  }

  pub fn token(&self) -> TypeToken {
    self.token
  }

  pub fn cast(&self, instance: &Instance) -> Option<Instance> {
    (self.cast)(instance)
  }
}

impl fmt::Debug for Facet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Facet({})", self.token)
  }
}
