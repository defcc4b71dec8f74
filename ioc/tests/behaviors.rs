use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use trellis_ioc::behaviors::{BehaviorStack, Caching, Guarding, Locking};
use trellis_ioc::{Blueprint, ComponentKey, Container, Error, Registration};

// --- Test Fixtures ---

struct Session {
  id: usize,
}

fn counting_session(counter: Arc<AtomicUsize>) -> Blueprint<Session> {
  Blueprint::new().default_constructor(move || Session {
    id: counter.fetch_add(1, Ordering::SeqCst),
  })
}

// --- Caching Tests ---

#[test]
fn test_cached_component_keeps_its_identity() {
  // Arrange
  let counter = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  container
    .register(Registration::component(counting_session(counter.clone())))
    .unwrap();

  // Act
  let first = container.get::<Session>(None).unwrap().unwrap();
  let second = container.get::<Session>(None).unwrap().unwrap();

  // Assert
  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_uncached_component_is_built_per_request() {
  // Arrange
  let counter = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  container
    .register(Registration::component(counting_session(counter.clone())).cached(false))
    .unwrap();

  // Act
  let first = container.get::<Session>(None).unwrap().unwrap();
  let second = container.get::<Session>(None).unwrap().unwrap();

  // Assert
  assert!(!Arc::ptr_eq(&first, &second));
  assert_eq!((first.id, second.id), (0, 1));
}

#[test]
fn test_container_default_can_turn_caching_off() {
  // Arrange
  let counter = Arc::new(AtomicUsize::new(0));
  let container = Container::with_defaults(
    "transient",
    trellis_ioc::Defaults {
      cache: false,
      ..Default::default()
    },
  );
  container
    .register(Registration::component(counting_session(counter.clone())))
    .unwrap();

  // Act
  container.get::<Session>(None).unwrap();
  container.get::<Session>(None).unwrap();

  // Assert
  assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_identity_holds_across_facets() {
  // Arrange
  trait Identified: Send + Sync {
    fn id(&self) -> usize;
  }
  impl Identified for Session {
    fn id(&self) -> usize {
      self.id
    }
  }
  let container = Container::new();
  container
    .register(Registration::component(
      counting_session(Arc::new(AtomicUsize::new(7))).facet::<dyn Identified>(|session| session),
    ))
    .unwrap();

  // Act
  let concrete = container.get::<Session>(None).unwrap().unwrap();
  let viewed = container.get::<dyn Identified>(None).unwrap().unwrap();

  // Assert
  assert_eq!(viewed.id(), 7);
  assert_eq!(
    Arc::as_ptr(&concrete) as *const u8,
    Arc::as_ptr(&viewed) as *const () as *const u8
  );
}

// --- Locking Tests ---

#[test]
fn test_locked_cache_builds_once_under_contention() {
  // Arrange
  let counter = Arc::new(AtomicUsize::new(0));
  let built = counter.clone();
  let blueprint = Blueprint::<Session>::new().default_constructor(move || {
    thread::sleep(Duration::from_millis(20));
    Session {
      id: built.fetch_add(1, Ordering::SeqCst),
    }
  });
  let container = Container::new();
  container.register(Registration::component(blueprint).locked(true)).unwrap();

  // Act
  thread::scope(|s| {
    for _ in 0..8 {
      s.spawn(|| {
        container.get::<Session>(None).unwrap().unwrap();
      });
    }
  });

  // Assert
  assert_eq!(counter.load(Ordering::SeqCst), 1);
}

// --- Guarding Tests ---

#[test]
fn test_guard_must_be_registered() {
  // Arrange
  let container = Container::new();
  container
    .register(
      Registration::component(counting_session(Arc::new(AtomicUsize::new(0)))).guarded_by("sessions.enabled"),
    )
    .unwrap();

  // Act
  let result = container.get::<Session>(None);

  // Assert
  match result {
    Err(Error::GuardMissing { guard, key }) => {
      assert_eq!(guard, ComponentKey::named("sessions.enabled"));
      assert_eq!(key, ComponentKey::of::<Session>());
    }
    other => panic!("expected a missing guard, got {:?}", other.map(|s| s.is_some())),
  }
}

#[test]
fn test_false_guard_rejects_and_true_guard_admits() {
  // Arrange
  let closed = Container::new();
  closed.add_instance_with_key("sessions.enabled", false).unwrap();
  closed
    .register(
      Registration::component(counting_session(Arc::new(AtomicUsize::new(0)))).guarded_by("sessions.enabled"),
    )
    .unwrap();

  let open = Container::new();
  open.add_instance_with_key("sessions.enabled", true).unwrap();
  open
    .register(
      Registration::component(counting_session(Arc::new(AtomicUsize::new(0)))).guarded_by("sessions.enabled"),
    )
    .unwrap();

  // Act
  let rejected = closed.get::<Session>(None);
  let admitted = open.get::<Session>(None);

  // Assert
  assert!(matches!(rejected, Err(Error::GuardRejected { .. })));
  assert!(admitted.unwrap().is_some());
}

#[test]
fn test_guard_errors_propagate() {
  // Arrange
  let container = Container::new();
  container
    .add_factory::<bool>("flaky.guard", |_: &Container| Err("guard backend unavailable".into()))
    .unwrap();
  container
    .register(Registration::component(counting_session(Arc::new(AtomicUsize::new(0)))).guarded_by("flaky.guard"))
    .unwrap();

  // Act
  let result = container.get::<Session>(None);

  // Assert
  match result {
    Err(Error::Invocation { member, .. }) => assert_eq!(member, "factory"),
    other => panic!("expected the guard's failure, got {:?}", other.map(|s| s.is_some())),
  }
}

#[test]
fn test_guard_is_not_cached_past_a_rejection() {
  // A rejected request leaves nothing behind; the next one asks the guard again.
  let enabled = Arc::new(AtomicBool::new(false));
  let flag = enabled.clone();

  // Arrange
  let container = Container::new();
  container
    .register(
      Registration::factory::<bool>(move |_: &Container| Ok(Arc::new(flag.load(Ordering::SeqCst))))
        .key("maintenance.over")
        .cached(false),
    )
    .unwrap();
  container
    .register(
      Registration::component(counting_session(Arc::new(AtomicUsize::new(0)))).guarded_by("maintenance.over"),
    )
    .unwrap();

  // Act
  let during = container.get::<Session>(None);
  enabled.store(true, Ordering::SeqCst);
  let after = container.get::<Session>(None);

  // Assert
  assert!(matches!(during, Err(Error::GuardRejected { .. })));
  assert!(after.unwrap().is_some());
}

// --- Decorating and Composition Tests ---

#[test]
fn test_decorator_runs_once_per_new_instance() {
  // Arrange
  let decorated = Arc::new(AtomicUsize::new(0));
  let seen = decorated.clone();
  let container = Container::new();
  container
    .register(
      Registration::component(counting_session(Arc::new(AtomicUsize::new(0)))).decorated::<Session>(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
      }),
    )
    .unwrap();

  // Act
  container.get::<Session>(None).unwrap();
  container.get::<Session>(None).unwrap();

  // Assert
  assert_eq!(decorated.load(Ordering::SeqCst), 1);
}

#[test]
fn test_decorator_failure_is_reported() {
  // Arrange
  let container = Container::new();
  container
    .register(
      Registration::component(counting_session(Arc::new(AtomicUsize::new(0))))
        .decorated::<Session>(|_| Err("audit log is read-only".into())),
    )
    .unwrap();

  // Act
  let result = container.get::<Session>(None);

  // Assert
  assert!(matches!(result, Err(Error::Invocation { member, .. }) if member == "decorate"));
}

#[test]
fn test_behavior_stack_wraps_in_order() {
  // Arrange
  let counter = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  container.add_instance_with_key("feature.sessions", true).unwrap();
  container
    .register(
      Registration::component(counting_session(counter.clone()))
        .cached(false)
        .behaviors(
          BehaviorStack::new()
            .wrap(Guarding::new("feature.sessions"))
            .wrap(Caching)
            .wrap(Locking),
        ),
    )
    .unwrap();

  // Act
  let adapter = container.adapter(&ComponentKey::of::<Session>()).unwrap();
  let first = container.get::<Session>(None).unwrap().unwrap();
  let second = container.get::<Session>(None).unwrap().unwrap();

  // Assert
  assert_eq!(
    adapter.descriptor(),
    format!("Locked(Cached(Guarded(AdaptiveInjection[{}])))", ComponentKey::of::<Session>())
  );
  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(counter.load(Ordering::SeqCst), 1);
}
