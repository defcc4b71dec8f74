use std::panic;
use trellis_ioc::{global, maybe_resolve, resolve, Blueprint, Container, Error, ParameterSpec, Registration};

struct UnregisteredService;

struct ReportJob;

fn main() {
  // --- The panicking `resolve!` macro ---
  println!("Resolving a service that was never registered...");
  let result = panic::catch_unwind(|| {
    let _service = resolve!(UnregisteredService);
  });
  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Caught the expected panic from resolve!.");

  // --- `maybe_resolve!` and `get()` ---
  assert!(maybe_resolve!(UnregisteredService).is_none());
  match global().get::<UnregisteredService>(None) {
    Ok(None) => println!("get() returned Ok(None) for the missing service."),
    Ok(Some(_)) => panic!("Should not have found the service!"),
    Err(err) => panic!("Unexpected resolution error: {}", err),
  }

  // --- Registered, but not satisfiable ---
  let container = Container::named("reports");
  container
    .register(Registration::component(Blueprint::<ReportJob>::new().constructor(
      "new",
      vec![ParameterSpec::of::<UnregisteredService>()],
      |_| Ok(ReportJob),
    )))
    .expect("registration failed");

  match container.verify() {
    Err(Error::Verification(errors)) => {
      for err in &errors {
        println!("verify: {}", err);
      }
    }
    other => panic!("expected verification to fail, got {:?}", other),
  }

  match container.get::<ReportJob>(None) {
    Err(err @ Error::Unsatisfiable { .. }) => println!("get(): {}", err),
    other => panic!("expected an unsatisfiable dependency, got {:?}", other.map(|job| job.is_some())),
  }
}
