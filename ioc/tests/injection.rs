use pretty_assertions::assert_eq;
use std::fmt;
use std::sync::Arc;
use trellis_ioc::{
  Blueprint, ComponentKey, Container, DefaultConstructorParameter, Error, Injectable, Injection, ParameterRef,
  ParameterSpec, Provider, Registration, TypeToken,
};

// --- Test Fixtures ---

struct Clock;

struct Journal {
  entries: Vec<String>,
}

impl Injectable for Clock {
  fn blueprint() -> Blueprint<Self> {
    Blueprint::new().default_constructor(|| Clock)
  }
}

#[derive(Default)]
struct Mailer {
  clock: Option<Arc<Clock>>,
  sender: Option<Arc<String>>,
  retries: u8,
  constructed_with: &'static str,
}

impl Injectable for Mailer {
  fn blueprint() -> Blueprint<Self> {
    Blueprint::new()
      .default_constructor(|| Mailer {
        constructed_with: "default",
        ..Mailer::default()
      })
      .constructor("with_clock", vec![ParameterSpec::of::<Clock>()], |args| {
        Ok(Mailer {
          clock: Some(args.component::<Clock>(0)?),
          constructed_with: "with_clock",
          ..Mailer::default()
        })
      })
      .constructor(
        "with_clock_and_sender",
        vec![ParameterSpec::of::<Clock>(), ParameterSpec::of::<String>()],
        |args| {
          Ok(Mailer {
            clock: Some(args.component::<Clock>(0)?),
            sender: Some(args.component::<String>(1)?),
            constructed_with: "with_clock_and_sender",
            ..Mailer::default()
          })
        },
      )
      .field("sender", ParameterSpec::of::<String>(), |mailer, args| {
        mailer.sender = Some(args.component::<String>(0)?);
        Ok(())
      })
      .setter("set_retries", ParameterSpec::of::<u8>(), |mailer, args| {
        mailer.retries = args.value::<u8>(0)?;
        Ok(())
      })
      .method("attach_clock", vec![ParameterSpec::of::<Clock>()], |mailer, args| {
        mailer.clock = Some(args.component::<Clock>(0)?);
        Ok(())
      })
  }
}

#[derive(Debug)]
struct Refused(&'static str);

impl fmt::Display for Refused {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "refused: {}", self.0)
  }
}

impl std::error::Error for Refused {}

// --- Constructor Injection Tests ---

#[test]
fn test_greediest_satisfiable_constructor_is_chosen() {
  // Arrange
  let container = Container::new();
  container.add_component::<Clock>().unwrap();
  container
    .register(Registration::injectable::<Mailer>().injection(Injection::Constructor))
    .unwrap();

  // Act
  let with_clock = container.get::<Mailer>(None).unwrap().unwrap();
  container.add_instance("noreply@example.org".to_string()).unwrap();
  container.remove_component(ComponentKey::of::<Mailer>()).unwrap();
  container
    .register(Registration::injectable::<Mailer>().injection(Injection::Constructor))
    .unwrap();
  let with_both = container.get::<Mailer>(None).unwrap().unwrap();

  // Assert
  assert_eq!(with_clock.constructed_with, "with_clock");
  assert_eq!(with_both.constructed_with, "with_clock_and_sender");
  assert_eq!(with_both.sender.as_deref().map(String::as_str), Some("noreply@example.org"));
}

#[test]
fn test_equally_greedy_constructors_are_rejected() {
  // Arrange
  struct Pair;
  let blueprint = Blueprint::<Pair>::new()
    .constructor("from_u8", vec![ParameterSpec::of::<u8>()], |_| Ok(Pair))
    .constructor("from_u16", vec![ParameterSpec::of::<u16>()], |_| Ok(Pair));
  let container = Container::new();
  container.add_instance(1_u8).unwrap();
  container.add_instance(2_u16).unwrap();
  container.register(Registration::component(blueprint)).unwrap();

  // Act
  let result = container.get::<Pair>(None);

  // Assert
  match result {
    Err(Error::TooManyConstructors { arity, .. }) => assert_eq!(arity, 1),
    other => panic!("expected too many constructors, got {:?}", other.map(|p| p.is_some())),
  }
}

#[test]
fn test_unsatisfiable_lists_every_missing_type() {
  // Arrange
  struct Report;
  let blueprint = Blueprint::<Report>::new().constructor(
    "new",
    vec![ParameterSpec::of::<u32>(), ParameterSpec::of::<String>(), ParameterSpec::of::<u32>()],
    |_| Ok(Report),
  );
  let container = Container::named("reports");
  container.register(Registration::component(blueprint)).unwrap();

  // Act
  let result = container.get::<Report>(None);

  // Assert
  match result {
    Err(Error::Unsatisfiable {
      unsatisfied, container, ..
    }) => {
      assert_eq!(unsatisfied, vec![TypeToken::of::<u32>(), TypeToken::of::<String>()]);
      assert_eq!(container, "reports");
    }
    other => panic!("expected unsatisfiable, got {:?}", other.map(|r| r.is_some())),
  }
}

#[test]
fn test_no_constructor_is_reported() {
  // Arrange
  struct Hollow;
  let container = Container::new();
  container.register(Registration::component(Blueprint::<Hollow>::new())).unwrap();

  // Act
  let result = container.get::<Hollow>(None);

  // Assert
  assert!(matches!(result, Err(Error::NoConstructor { .. })));
}

#[test]
fn test_default_constructor_marker_pins_the_zero_argument_constructor() {
  // Arrange
  let container = Container::new();
  container.add_component::<Clock>().unwrap();
  container.add_instance("noreply@example.org".to_string()).unwrap();
  let parameters: Vec<ParameterRef> = vec![Arc::new(DefaultConstructorParameter)];
  container
    .register(
      Registration::injectable::<Mailer>()
        .injection(Injection::Constructor)
        .parameters(parameters),
    )
    .unwrap();

  // Act
  let mailer = container.get::<Mailer>(None).unwrap().unwrap();

  // Assert
  assert_eq!(mailer.constructed_with, "default");
  assert!(mailer.clock.is_none());
}

#[test]
fn test_constructor_errors_are_wrapped_with_the_member() {
  // Arrange
  struct Fragile;
  let blueprint = Blueprint::<Fragile>::new().constructor("open", Vec::new(), |_| Err(Refused("disk full").into()));
  let container = Container::new();
  container.register(Registration::component(blueprint)).unwrap();

  // Act
  let result = container.get::<Fragile>(None);

  // Assert
  match result {
    Err(Error::Invocation { member, source, .. }) => {
      assert_eq!(member, "open");
      assert_eq!(source.to_string(), "refused: disk full");
    }
    other => panic!("expected an invocation error, got {:?}", other.map(|f| f.is_some())),
  }
}

#[test]
fn test_container_errors_from_user_code_pass_through() {
  // Arrange
  struct Lookup;
  let blueprint = Blueprint::<Lookup>::new().constructor("new", Vec::new(), |_| {
    Err(Error::ConfigNotFound("lookup.yaml".to_string()).into())
  });
  let container = Container::new();
  container.register(Registration::component(blueprint)).unwrap();

  // Act
  let result = container.get::<Lookup>(None);

  // Assert
  assert!(matches!(result, Err(Error::ConfigNotFound(path)) if path == "lookup.yaml"));
}

// --- Member Injection Tests ---

#[test]
fn test_field_injection() {
  // Arrange
  let container = Container::new();
  container.add_instance("ops@example.org".to_string()).unwrap();
  container
    .register(Registration::injectable::<Mailer>().injection(Injection::Field))
    .unwrap();

  // Act
  let mailer = container.get::<Mailer>(None).unwrap().unwrap();

  // Assert
  assert_eq!(mailer.constructed_with, "default");
  assert_eq!(mailer.sender.as_deref().map(String::as_str), Some("ops@example.org"));
  assert_eq!(mailer.retries, 0);
}

#[test]
fn test_setter_injection_uses_the_property_name() {
  // Arrange
  let container = Container::with_defaults(
    "setters",
    trellis_ioc::Defaults {
      use_names: true,
      ..Default::default()
    },
  );
  container.add_instance_with_key("retries", "3".to_string()).unwrap();
  container
    .register(Registration::injectable::<Mailer>().injection(Injection::Setter))
    .unwrap();

  // Act
  let mailer = container.get::<Mailer>(None).unwrap().unwrap();

  // Assert
  assert_eq!(mailer.retries, 3);
  assert!(mailer.sender.is_none());
}

#[test]
fn test_method_injection() {
  // Arrange
  let container = Container::new();
  container.add_component::<Clock>().unwrap();
  container
    .register(Registration::injectable::<Mailer>().injection(Injection::Method))
    .unwrap();

  // Act
  let mailer = container.get::<Mailer>(None).unwrap().unwrap();

  // Assert
  assert_eq!(mailer.constructed_with, "default");
  assert!(mailer.clock.is_some());
}

#[test]
fn test_member_injection_needs_a_zero_argument_constructor() {
  // Arrange
  let blueprint = Blueprint::<Journal>::new()
    .constructor("new", vec![ParameterSpec::of::<Clock>()], |_| Ok(Journal { entries: Vec::new() }))
    .field("entries", ParameterSpec::of::<String>(), |journal, args| {
      journal.entries.push(args.value::<String>(0)?);
      Ok(())
    });
  let container = Container::new();
  container.register(Registration::component(blueprint).injection(Injection::Field)).unwrap();

  // Act
  let result = container.get::<Journal>(None);

  // Assert
  assert!(matches!(result, Err(Error::NoDefaultConstructor { .. })));
}

#[test]
fn test_adaptive_injection_runs_constructor_then_members() {
  // Arrange
  let container = Container::new();
  container.add_component::<Clock>().unwrap();
  container.add_instance("team@example.org".to_string()).unwrap();
  container.add_instance(5_u8).unwrap();
  container.add_component::<Mailer>().unwrap();

  // Act
  let mailer = container.get::<Mailer>(None).unwrap().unwrap();

  // Assert
  assert_eq!(mailer.constructed_with, "with_clock_and_sender");
  assert_eq!(mailer.retries, 5);
  assert!(mailer.clock.is_some());
}

#[test]
fn test_composite_injection_falls_back_to_the_next_strategy() {
  // Arrange
  let container = Container::new();
  container.add_component::<Clock>().unwrap();
  container
    .register(
      Registration::injectable::<Mailer>().injection(Injection::Composite(vec![Injection::Field, Injection::Method])),
    )
    .unwrap();

  // Act
  let mailer = container.get::<Mailer>(None).unwrap().unwrap();

  // Assert
  // Field injection needs a String sender, which is missing; method injection works.
  assert!(mailer.sender.is_none());
  assert!(mailer.clock.is_some());
}

// --- Provider and Factory Tests ---

#[test]
fn test_provider_resolves_declared_parameters() {
  // Arrange
  let container = Container::new();
  container.add_instance(8080_u16).unwrap();
  container.add_instance("localhost".to_string()).unwrap();
  container
    .add_provider(
      "base_url",
      Provider::new(
        "base_url",
        vec![ParameterSpec::of::<String>(), ParameterSpec::of::<u16>()],
        |args| {
          Ok(Arc::new(format!(
            "http://{}:{}",
            args.component::<String>(0)?,
            args.value::<u16>(1)?
          )))
        },
      ),
    )
    .unwrap();

  // Act
  let url = container.get_by_key::<String>("base_url").unwrap().unwrap();

  // Assert
  assert_eq!(*url, "http://localhost:8080");
}

#[test]
fn test_provider_with_missing_parameters_is_unsatisfiable() {
  // Arrange
  let container = Container::new();
  container
    .add_provider(
      "port_label",
      Provider::new("port_label", vec![ParameterSpec::of::<u16>()], |args| {
        Ok(Arc::new(format!("port {}", args.value::<u16>(0)?)))
      }),
    )
    .unwrap();

  // Act
  let result = container.get_component("port_label");

  // Assert
  assert!(matches!(result, Err(Error::Unsatisfiable { .. })));
}

#[test]
fn test_factory_receives_the_owning_container() {
  // Arrange
  let parent = Container::named("parent");
  parent
    .add_factory::<String>("greeting", |c: &Container| {
      Ok(Arc::new(format!("hello from {}", c.name())))
    })
    .unwrap();
  let child = parent.make_child().unwrap();

  // Act
  let greeting = child.get_by_key::<String>("greeting").unwrap().unwrap();

  // Assert
  assert_eq!(*greeting, "hello from parent");
}

#[test]
fn test_descriptor_reflects_the_adapter_chain() {
  // Arrange
  let container = Container::new();
  container.add_component::<Clock>().unwrap();
  container
    .register(Registration::injectable::<Mailer>().injection(Injection::Method).cached(false))
    .unwrap();

  // Act
  let clock = container.adapter(&ComponentKey::of::<Clock>()).unwrap();
  let mailer = container.adapter(&ComponentKey::of::<Mailer>()).unwrap();

  // Assert
  assert!(clock.descriptor().starts_with("Cached(AdaptiveInjection["));
  assert!(mailer.descriptor().starts_with("MethodInjection["));
}
