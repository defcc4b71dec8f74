use std::sync::Arc;
use trellis_ioc::{Blueprint, Container, Injectable, ParameterSpec};

trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

impl Injectable for ConsoleLogger {
  fn blueprint() -> Blueprint<Self> {
    Blueprint::new()
      .default_constructor(|| ConsoleLogger)
      .facet::<dyn Logger>(|logger| logger)
  }
}

trait Section: Send + Sync {
  fn render(&self) -> String;
}

struct Summary;
impl Section for Summary {
  fn render(&self) -> String {
    "summary".to_string()
  }
}

struct Totals;
impl Section for Totals {
  fn render(&self) -> String {
    "totals".to_string()
  }
}

/// Built by the container: the logger through the constructor, every
/// registered section as a list, and the title through a setter.
struct ReportService {
  logger: Arc<dyn Logger>,
  sections: Vec<Arc<dyn Section>>,
  title: String,
}

impl ReportService {
  fn set_title(&mut self, title: String) {
    self.title = title;
  }

  fn generate(&self) -> String {
    self.logger.log("Starting report generation.");
    let body: Vec<String> = self.sections.iter().map(|section| section.render()).collect();
    self.logger.log("Finished report generation.");
    format!("{}: {}", self.title, body.join(", "))
  }
}

impl Injectable for ReportService {
  fn blueprint() -> Blueprint<Self> {
    Blueprint::new()
      .constructor(
        "new",
        vec![ParameterSpec::of::<dyn Logger>(), ParameterSpec::list_of::<dyn Section>()],
        |args| {
          Ok(ReportService {
            logger: args.component::<dyn Logger>(0)?,
            sections: args.list::<dyn Section>(1)?,
            title: "untitled".to_string(),
          })
        },
      )
      .setter("set_title", ParameterSpec::of::<String>(), |report, args| {
        report.set_title(args.value::<String>(0)?);
        Ok(())
      })
  }
}

fn main() -> Result<(), trellis_ioc::Error> {
  let container = Container::new();
  container.add_component::<ConsoleLogger>()?;
  container.add_shared("summary", Arc::new(Summary) as Arc<dyn Section>)?;
  container.add_shared("totals", Arc::new(Totals) as Arc<dyn Section>)?;
  container.add_instance("Quarterly report".to_string())?;
  container.add_component::<ReportService>()?;

  container.verify()?;
  let report = container.get::<ReportService>(None)?.expect("report service is registered");
  let rendered = report.generate();
  println!("{}", rendered);
  assert_eq!(rendered, "Quarterly report: summary, totals");
  Ok(())
}
