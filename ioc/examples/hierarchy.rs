use trellis_ioc::{global, Container, ContainerConfig, DescribingVisitor};

const CONFIG: &str = r#"
name: app
use_names: true
properties:
  greeting: "Hello"
  request.timeout: 30
"#;

/// Registers request-scoped data in a child so it never leaks into the
/// application container.
fn handle_request(app: &Container, user: &str) -> Result<String, trellis_ioc::Error> {
  let request = app.make_child()?;
  request.add_instance(user.to_string())?;

  let greeting = request
    .get_by_key::<String>("greeting")?
    .expect("greeting is configured");
  let name = request.get::<String>(None)?.expect("user was registered");
  Ok(format!("{}, {} (handled by {})", greeting, name, request.name()))
}

fn main() -> Result<(), trellis_ioc::Error> {
  let config = ContainerConfig::from_yaml_str(CONFIG)?;
  let app = Container::from_config(&config)?;

  // --- Child containers fall back to their parent ---
  let first = handle_request(&app, "ada")?;
  let second = handle_request(&app, "grace")?;
  println!("{}", first);
  println!("{}", second);
  assert!(first.starts_with("Hello, ada"));

  // --- Tiered children see one level up only ---
  let module = app.make_child()?;
  module.add_instance(7_u8)?;
  let plugin = module.make_tiered_child()?;
  assert_eq!(*plugin.get::<u8>(None)?.expect("visible from the parent"), 7);
  assert!(plugin.get_by_key::<String>("greeting")?.is_none());

  // --- Isolation from the global container ---
  assert!(global().get_by_key::<String>("greeting")?.is_none());

  let mut listing = DescribingVisitor::new();
  app.accept(&mut listing);
  print!("{}", listing.into_string());
  Ok(())
}
