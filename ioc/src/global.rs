//! The global IoC container instance and access functions.

use crate::container::Container;
use once_cell::sync::Lazy;

// Created on first access, named "global".
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(|| Container::named("global"));

/// Provides a reference to the global container instance.
///
/// # Examples
///
/// ```
/// use trellis_ioc::global;
///
/// fn register_services() {
///   global()
///     .add_instance_with_name("greeting", String::from("Hello from global!"))
///     .unwrap();
/// }
/// # register_services();
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
