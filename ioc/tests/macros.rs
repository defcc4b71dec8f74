// ioc/tests/macros.rs

//! Tests specifically for the resolution macros.
//! This file verifies the behavior of:
//! - `maybe_resolve!`
//! - `resolve!`
//! - `maybe_resolve_from!`
//! - `resolve_from!`
//! against both the global `Container` and custom `Container` instances.

use serial_test::serial;
use std::sync::Arc;
use trellis_ioc::{
  global, maybe_resolve, maybe_resolve_from, resolve, resolve_from, Blueprint, Container, ParameterSpec, Registration,
};

// --- Test Fixtures ---

struct MacroTestService {
  value: i32,
}
trait MacroTestTrait: Send + Sync {
  fn value(&self) -> i32;
}
impl MacroTestTrait for MacroTestService {
  fn value(&self) -> i32 {
    self.value
  }
}
struct UnregisteredService; // An unregistered type

// --- Global Macro Tests ---

#[test]
#[serial]
fn test_maybe_resolve_global() {
  // Arrange
  global().add_singleton(|| MacroTestService { value: 42 }).unwrap();
  global()
    .add_singleton_with_name("named", || MacroTestService { value: 43 })
    .unwrap();
  global()
    .add_singleton_trait::<dyn MacroTestTrait>(|| Arc::new(MacroTestService { value: 44 }))
    .unwrap();
  global()
    .add_singleton_trait_with_name::<dyn MacroTestTrait>("named_trait", || {
      Arc::new(MacroTestService { value: 45 })
    })
    .unwrap();

  // Act & Assert: Success cases
  assert_eq!(maybe_resolve!(MacroTestService).unwrap().value, 42);
  assert_eq!(maybe_resolve!(MacroTestService, "named").unwrap().value, 43);
  assert_eq!(maybe_resolve!(trait MacroTestTrait).unwrap().value(), 44);
  assert_eq!(
    maybe_resolve!(trait MacroTestTrait, "named_trait")
      .unwrap()
      .value(),
    45
  );

  // Act & Assert: Failure cases
  assert!(maybe_resolve!(UnregisteredService).is_none());
  assert!(maybe_resolve!(MacroTestService, "missing_name").is_none());
  trait MissingTrait: Send + Sync {}
  assert!(maybe_resolve!(trait MissingTrait).is_none());
  assert!(maybe_resolve!(trait MacroTestTrait, "missing_name").is_none());
}

#[test]
#[serial]
#[should_panic(expected = "Failed to resolve required service:")]
fn test_resolve_panics_on_missing() {
  resolve!(UnregisteredService);
}

#[test]
#[serial]
#[should_panic(expected = "Failed to resolve required service with name 'nowhere'")]
fn test_resolve_names_the_missing_qualifier() {
  resolve!(UnregisteredService, "nowhere");
}

// --- `_from` Macro Tests with a custom `Container` ---

#[test]
fn test_macros_with_custom_container() {
  // Arrange
  let container = Container::new();
  container.add_singleton(|| MacroTestService { value: 100 }).unwrap();
  container
    .add_singleton_with_name("named", || MacroTestService { value: 101 })
    .unwrap();
  container
    .add_singleton_trait::<dyn MacroTestTrait>(|| Arc::new(MacroTestService { value: 102 }))
    .unwrap();
  container
    .add_singleton_trait_with_name::<dyn MacroTestTrait>("named_trait", || {
      Arc::new(MacroTestService { value: 103 })
    })
    .unwrap();

  // Act & Assert with maybe_resolve_from!
  assert_eq!(
    maybe_resolve_from!(&container, MacroTestService)
      .unwrap()
      .value,
    100
  );
  assert_eq!(
    maybe_resolve_from!(&container, MacroTestService, "named")
      .unwrap()
      .value,
    101
  );
  assert!(maybe_resolve_from!(&container, UnregisteredService).is_none());

  // Act & Assert with resolve_from!
  assert_eq!(resolve_from!(&container, trait MacroTestTrait).value(), 102);
  assert_eq!(
    resolve_from!(&container, trait MacroTestTrait, "named_trait").value(),
    103
  );
}

#[test]
#[should_panic(expected = "Failed to resolve required service:")]
fn test_resolve_from_panics_on_missing_in_custom_container() {
  let container = Container::new();
  trait MissingTrait: Send + Sync {}
  resolve_from!(&container, trait MissingTrait);
}

#[test]
#[should_panic(expected = "Failed to resolve service")]
fn test_maybe_resolve_from_panics_on_resolution_errors() {
  // A registered component that cannot be built is an error, not `None`.
  struct NeedsMissing;
  let container = Container::new();
  container
    .register(Registration::component(Blueprint::<NeedsMissing>::new().constructor(
      "new",
      vec![ParameterSpec::of::<UnregisteredService>()],
      |_| Ok(NeedsMissing),
    )))
    .unwrap();

  let _ = maybe_resolve_from!(&container, NeedsMissing);
}

#[test]
fn test_macros_see_parent_components() {
  // Arrange
  let parent = Container::new();
  parent.add_instance(MacroTestService { value: 7 }).unwrap();
  let child = parent.make_child().unwrap();

  // Act
  let service = resolve_from!(&child, MacroTestService);

  // Assert
  assert_eq!(service.value, 7);
}
