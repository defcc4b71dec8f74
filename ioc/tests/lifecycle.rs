use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use trellis_ioc::{
  BoxError, Blueprint, ComponentKey, Container, Error, Lifecycle, LifecycleState, Registration, Transition,
};

// --- Test Fixtures ---

type Journal = Arc<Mutex<Vec<String>>>;

/// Records every callback in a shared journal.
struct Service {
  name: &'static str,
  journal: Journal,
  fail_on_start: bool,
}

impl Lifecycle for Service {
  fn start(&self) -> Result<(), BoxError> {
    if self.fail_on_start {
      return Err(format!("{} cannot bind its port", self.name).into());
    }
    self.journal.lock().push(format!("start {}", self.name));
    Ok(())
  }

  fn stop(&self) -> Result<(), BoxError> {
    self.journal.lock().push(format!("stop {}", self.name));
    Ok(())
  }

  fn dispose(&self) -> Result<(), BoxError> {
    self.journal.lock().push(format!("dispose {}", self.name));
    Ok(())
  }
}

fn service(name: &'static str, journal: &Journal) -> Registration {
  let journal = journal.clone();
  Registration::component(
    Blueprint::new()
      .default_constructor(move || Service {
        name,
        journal: journal.clone(),
        fail_on_start: false,
      })
      .with_lifecycle(),
  )
  .key(name)
}

fn entries(journal: &Journal) -> Vec<String> {
  journal.lock().clone()
}

// --- Container State Tests ---

#[test]
fn test_state_machine_of_a_container() {
  // Arrange
  let container = Container::new();

  // Act & Assert
  assert_eq!(container.state(), LifecycleState::Constructed);
  container.start().unwrap();
  assert_eq!(container.state(), LifecycleState::Started);
  container.stop().unwrap();
  assert_eq!(container.state(), LifecycleState::Stopped);
  container.start().unwrap();
  container.stop().unwrap();
  container.dispose().unwrap();
  assert_eq!(container.state(), LifecycleState::Disposed);
}

#[test]
fn test_invalid_transitions_are_refused() {
  // Arrange
  let container = Container::named("app");

  // Act & Assert
  match container.stop() {
    Err(Error::Lifecycle {
      target,
      current,
      attempted,
    }) => {
      assert_eq!(target, "container 'app'");
      assert_eq!(current, LifecycleState::Constructed);
      assert_eq!(attempted, Transition::Stop);
    }
    other => panic!("expected a lifecycle error, got {:?}", other),
  }

  container.start().unwrap();
  assert!(matches!(container.start(), Err(Error::Lifecycle { .. })));
  assert!(matches!(
    container.dispose(),
    Err(Error::Lifecycle {
      current: LifecycleState::Started,
      ..
    })
  ));

  container.stop().unwrap();
  container.dispose().unwrap();
  assert!(matches!(container.dispose(), Err(Error::Lifecycle { .. })));
  assert!(matches!(container.start(), Err(Error::Lifecycle { .. })));
}

#[test]
fn test_components_cannot_be_removed_while_started() {
  // Arrange
  let container = Container::new();
  container.add_instance(1_u8).unwrap();
  container.start().unwrap();

  // Act
  let removal = container.remove_component(ComponentKey::of::<u8>());

  // Assert
  assert!(matches!(
    removal,
    Err(Error::Lifecycle {
      attempted: Transition::RemoveComponent,
      ..
    })
  ));

  container.stop().unwrap();
  assert!(container.remove_component(ComponentKey::of::<u8>()).unwrap().is_some());
}

#[test]
fn test_children_can_be_added_to_a_started_container() {
  // Arrange
  let journal = Journal::default();
  let app = Container::named("app");
  app.start().unwrap();

  // Act
  let request = app.make_child().unwrap();
  request.register(service("session", &journal)).unwrap();
  let adopted = Container::named("adopted");
  app.add_child(&adopted).unwrap();

  // Assert
  assert_eq!(request.state(), LifecycleState::Constructed);
  assert_eq!(adopted.state(), LifecycleState::Constructed);
  assert!(entries(&journal).is_empty());

  request.start().unwrap();
  app.stop().unwrap();
  assert_eq!(request.state(), LifecycleState::Stopped);
  assert_eq!(adopted.state(), LifecycleState::Constructed);
  assert_eq!(entries(&journal), vec!["start session", "stop session"]);
}

#[test]
fn test_disposed_container_refuses_registrations_and_children() {
  // Arrange
  let container = Container::named("app");
  container.dispose().unwrap();

  // Act
  let registration = container.add_instance(1_u8);
  let spawn = container.make_child();

  // Assert
  assert!(matches!(
    registration,
    Err(Error::Lifecycle {
      current: LifecycleState::Disposed,
      attempted: Transition::AddComponent,
      ..
    })
  ));
  assert!(matches!(
    spawn,
    Err(Error::Lifecycle {
      attempted: Transition::AddChild,
      ..
    })
  ));
  assert!(container.adapter(&ComponentKey::of::<u8>()).is_none());
}

#[test]
fn test_lifecycle_component_added_while_started_is_started() {
  // Arrange
  let journal = Journal::default();
  let container = Container::new();
  container.register(service("early", &journal)).unwrap();
  container.start().unwrap();

  // Act
  container.register(service("late", &journal)).unwrap();
  container.stop().unwrap();

  // Assert
  assert_eq!(
    entries(&journal),
    vec!["start early", "start late", "stop early", "stop late"]
  );
}

// --- Component Lifecycle Tests ---

#[test]
fn test_components_follow_the_container_in_registration_order() {
  // Arrange
  let journal = Journal::default();
  let container = Container::new();
  container.register(service("db", &journal)).unwrap();
  container.register(service("cache", &journal)).unwrap();
  container.register(service("web", &journal)).unwrap();

  // Act
  container.start().unwrap();
  container.stop().unwrap();
  container.dispose().unwrap();

  // Assert
  assert_eq!(
    entries(&journal),
    vec![
      "start db",
      "start cache",
      "start web",
      "stop db",
      "stop cache",
      "stop web",
      "dispose db",
      "dispose cache",
      "dispose web",
    ]
  );
}

#[test]
fn test_start_instantiates_lifecycle_components() {
  // Arrange
  let journal = Journal::default();
  let container = Container::new();
  container.register(service("worker", &journal)).unwrap();

  // Act
  container.start().unwrap();
  let worker = container.get_by_key::<Service>("worker").unwrap().unwrap();

  // Assert
  assert_eq!(worker.name, "worker");
  assert_eq!(entries(&journal), vec!["start worker"]);
}

#[test]
fn test_dispose_drops_cached_instances() {
  // Arrange
  let journal = Journal::default();
  let container = Container::new();
  container.register(service("pool", &journal)).unwrap();
  container.start().unwrap();
  let before = container.get_by_key::<Service>("pool").unwrap().unwrap();

  // Act
  container.stop().unwrap();
  container.dispose().unwrap();
  let after = container.get_by_key::<Service>("pool").unwrap().unwrap();

  // Assert
  assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn test_managed_instances_receive_callbacks() {
  // Arrange
  let journal = Journal::default();
  let container = Container::new();
  container
    .register(Registration::managed_instance(Service {
      name: "scheduler",
      journal: journal.clone(),
      fail_on_start: false,
    }))
    .unwrap();

  // Act
  container.start().unwrap();
  container.stop().unwrap();
  container.dispose().unwrap();

  // Assert
  assert_eq!(entries(&journal), vec!["start scheduler", "stop scheduler", "dispose scheduler"]);
}

#[test]
fn test_failing_callback_names_the_component_and_phase() {
  // Arrange
  let journal = Journal::default();
  let container = Container::new();
  container
    .register(Registration::managed_instance(Service {
      name: "listener",
      journal: journal.clone(),
      fail_on_start: true,
    }))
    .unwrap();

  // Act
  let result = container.start();

  // Assert
  match result {
    Err(Error::LifecycleInvocation { key, phase, source }) => {
      assert_eq!(key, ComponentKey::of::<Service>());
      assert_eq!(phase, Transition::Start);
      assert_eq!(source.to_string(), "listener cannot bind its port");
    }
    other => panic!("expected a lifecycle invocation error, got {:?}", other),
  }
  assert!(entries(&journal).is_empty());
}

#[test]
fn test_automatic_components_are_built_on_start() {
  // Arrange
  let built = Arc::new(Mutex::new(0_usize));
  let counter = built.clone();
  struct Warmup;
  let container = Container::new();
  container
    .register(
      Registration::component(Blueprint::<Warmup>::new().default_constructor(move || {
        *counter.lock() += 1;
        Warmup
      }))
      .automatic(),
    )
    .unwrap();

  // Act
  let before_start = *built.lock();
  container.start().unwrap();
  container.get::<Warmup>(None).unwrap();

  // Assert
  assert_eq!(before_start, 0);
  assert_eq!(*built.lock(), 1);
}

#[test]
fn test_uncached_lifecycle_components_are_left_alone() {
  // Arrange
  let journal = Journal::default();
  let container = Container::new();
  container.register(service("request", &journal).cached(false)).unwrap();

  // Act
  container.start().unwrap();
  container.stop().unwrap();

  // Assert
  assert!(entries(&journal).is_empty());
}

// --- Cascading Tests ---

#[test]
fn test_lifecycle_cascades_to_children_after_local_components() {
  // Arrange
  let journal = Journal::default();
  let parent = Container::named("parent");
  parent.register(service("parent.db", &journal)).unwrap();
  let child = parent.make_child().unwrap();
  child.register(service("child.handler", &journal)).unwrap();

  // Act
  parent.start().unwrap();
  let child_state = child.state();
  parent.stop().unwrap();
  parent.dispose().unwrap();

  // Assert
  assert_eq!(child_state, LifecycleState::Started);
  assert_eq!(child.state(), LifecycleState::Disposed);
  assert_eq!(
    entries(&journal),
    vec![
      "start parent.db",
      "start child.handler",
      "stop parent.db",
      "stop child.handler",
      "dispose parent.db",
      "dispose child.handler",
    ]
  );
}

#[test]
fn test_cascade_skips_children_already_in_the_target_state() {
  // Arrange
  let parent = Container::new();
  let child = parent.make_child().unwrap();
  child.start().unwrap();

  // Act
  let result = parent.start();

  // Assert
  assert!(result.is_ok());
  assert_eq!(child.state(), LifecycleState::Started);
}

#[test]
fn test_dropped_children_are_not_cascaded_to() {
  // Arrange
  let journal = Journal::default();
  let parent = Container::new();
  {
    let child = parent.make_child().unwrap();
    child.register(service("short.lived", &journal)).unwrap();
  }

  // Act
  parent.start().unwrap();

  // Assert
  assert!(parent.children().is_empty());
  assert!(entries(&journal).is_empty());
}
