use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use trellis_ioc::{global, resolve, BoxError, Container, Lifecycle, Registration};

// A service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Opens and closes a (pretend) connection pool with the container.
struct ConnectionPool {
  open: AtomicUsize,
}

impl Lifecycle for ConnectionPool {
  fn start(&self) -> Result<(), BoxError> {
    self.open.store(4, Ordering::SeqCst);
    println!("pool: opened 4 connections");
    Ok(())
  }

  fn stop(&self) -> Result<(), BoxError> {
    self.open.store(0, Ordering::SeqCst);
    println!("pool: closed all connections");
    Ok(())
  }

  fn dispose(&self) -> Result<(), BoxError> {
    println!("pool: released");
    Ok(())
  }
}

fn main() -> Result<(), trellis_ioc::Error> {
  // --- Singletons and transients ---
  global().add_singleton_with_name("singleton_tracker", || RequestTracker {
    id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
  })?;
  global().add_transient_with_name("transient_tracker", || RequestTracker {
    id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
  })?;

  let s1 = resolve!(RequestTracker, "singleton_tracker");
  let s2 = resolve!(RequestTracker, "singleton_tracker");
  println!("Singleton IDs: {} {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2), "Singleton instances should be identical");

  let t1 = resolve!(RequestTracker, "transient_tracker");
  let t2 = resolve!(RequestTracker, "transient_tracker");
  println!("Transient IDs: {} {}", t1.id, t2.id);
  assert_ne!(t1.id, t2.id);

  // --- Start, stop and dispose ---
  let container = Container::named("server");
  container.register(Registration::managed_instance(ConnectionPool {
    open: AtomicUsize::new(0),
  }))?;
  let pool = container.get::<ConnectionPool>(None)?.expect("pool is registered");

  container.start()?;
  assert_eq!(pool.open.load(Ordering::SeqCst), 4);
  container.stop()?;
  assert_eq!(pool.open.load(Ordering::SeqCst), 0);
  container.dispose()?;

  // A disposed container cannot be restarted.
  assert!(container.start().is_err());
  println!("container is {}", container.state());
  Ok(())
}
