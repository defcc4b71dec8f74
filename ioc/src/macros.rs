//! Public macros for ergonomic component resolution.

use crate::error::Result;
use std::sync::Arc;

#[doc(hidden)]
#[track_caller]
pub fn __required<T: ?Sized>(resolved: Result<Option<Arc<T>>>, service: &str, name: Option<&str>) -> Arc<T> {
  match (resolved, name) {
    (Ok(Some(component)), _) => component,
    (Ok(None), None) => panic!("Failed to resolve required service: {}", service),
    (Ok(None), Some(name)) => panic!("Failed to resolve required service with name '{}': {}", name, service),
    (Err(err), _) => panic!("Failed to resolve service {}: {}", service, err),
  }
}

#[doc(hidden)]
#[track_caller]
pub fn __optional<T: ?Sized>(resolved: Result<Option<Arc<T>>>, service: &str) -> Option<Arc<T>> {
  match resolved {
    Ok(component) => component,
    Err(err) => panic!("Failed to resolve service {}: {}", service, err),
  }
}

/// Resolves a component from the given container.
///
/// # Panics
///
/// If the component is not registered, or resolving it fails.
#[macro_export]
macro_rules! resolve_from {
  ($container:expr, trait $trait_ident:ident) => {
    $crate::macros::__required(
      $crate::Container::get::<dyn $trait_ident>($container, None),
      std::any::type_name::<dyn $trait_ident>(),
      None,
    )
  };

  ($container:expr, trait $trait_ident:ident, $name:expr) => {
    $crate::macros::__required(
      $crate::Container::get::<dyn $trait_ident>($container, Some($name)),
      std::any::type_name::<dyn $trait_ident>(),
      Some($name),
    )
  };

  ($container:expr, $type:ty) => {
    $crate::macros::__required(
      $crate::Container::get::<$type>($container, None),
      std::any::type_name::<$type>(),
      None,
    )
  };

  ($container:expr, $type:ty, $name:expr) => {
    $crate::macros::__required(
      $crate::Container::get::<$type>($container, Some($name)),
      std::any::type_name::<$type>(),
      Some($name),
    )
  };
}

/// Like [`resolve_from!`], but returns `None` for a missing component.
///
/// # Panics
///
/// If resolving a registered component fails, e.g. on a cycle.
#[macro_export]
macro_rules! maybe_resolve_from {
  ($container:expr, trait $trait_ident:ident) => {
    $crate::macros::__optional(
      $crate::Container::get::<dyn $trait_ident>($container, None),
      std::any::type_name::<dyn $trait_ident>(),
    )
  };

  ($container:expr, trait $trait_ident:ident, $name:expr) => {
    $crate::macros::__optional(
      $crate::Container::get::<dyn $trait_ident>($container, Some($name)),
      std::any::type_name::<dyn $trait_ident>(),
    )
  };

  ($container:expr, $type:ty) => {
    $crate::macros::__optional(
      $crate::Container::get::<$type>($container, None),
      std::any::type_name::<$type>(),
    )
  };

  ($container:expr, $type:ty, $name:expr) => {
    $crate::macros::__optional(
      $crate::Container::get::<$type>($container, Some($name)),
      std::any::type_name::<$type>(),
    )
  };
}

/// Resolves a component from the global container.
///
/// This macro is the primary way to get dependencies. It panics if the
/// requested component is not registered, ensuring that all required
/// dependencies are present at runtime.
///
/// # Panics
///
/// If the component cannot be resolved. For a non-panicking version, use
/// [`maybe_resolve!`] or `global().get(...)` directly.
///
/// # Examples
///
/// ```
/// use trellis_ioc::{global, resolve};
///
/// global().add_singleton(|| 7_u64).unwrap();
///
/// let lucky = resolve!(u64);
/// assert_eq!(*lucky, 7);
/// ```
///
/// ```
/// use trellis_ioc::{global, resolve};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// global().add_singleton_trait::<dyn Greeter>(|| Arc::new(EnglishGreeter)).unwrap();
///
/// let greeter = resolve!(trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
  (trait $trait_ident:ident) => {
    $crate::resolve_from!($crate::global(), trait $trait_ident)
  };

  (trait $trait_ident:ident, $name:expr) => {
    $crate::resolve_from!($crate::global(), trait $trait_ident, $name)
  };

  ($type:ty) => {
    $crate::resolve_from!($crate::global(), $type)
  };

  ($type:ty, $name:expr) => {
    $crate::resolve_from!($crate::global(), $type, $name)
  };
}

/// Resolves a component from the global container, `None` if it is missing.
#[macro_export]
macro_rules! maybe_resolve {
  (trait $trait_ident:ident) => {
    $crate::maybe_resolve_from!($crate::global(), trait $trait_ident)
  };

  (trait $trait_ident:ident, $name:expr) => {
    $crate::maybe_resolve_from!($crate::global(), trait $trait_ident, $name)
  };

  ($type:ty) => {
    $crate::maybe_resolve_from!($crate::global(), $type)
  };

  ($type:ty, $name:expr) => {
    $crate::maybe_resolve_from!($crate::global(), $type, $name)
  };
}
