use std::sync::Arc;
use trellis_ioc::{global, resolve, Blueprint, Container, ParameterSpec, Registration};

// --- Abstraction and Implementations ---
trait MessageSender: Send + Sync {
  fn send(&self, to: &str, message: &str) -> String;
}

struct EmailSender;
impl MessageSender for EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email to {}: '{}'", to, message)
  }
}

struct SmsSender;
impl MessageSender for SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}

/// Always pages through SMS, whatever else is registered.
struct OnCallPager {
  sender: Arc<dyn MessageSender>,
}

fn main() {
  // --- Global registration by qualifier ---
  global()
    .add_singleton_trait_with_name::<dyn MessageSender>("email", || Arc::new(EmailSender))
    .expect("email sender registered twice");
  global()
    .add_singleton_trait_with_name::<dyn MessageSender>("sms", || Arc::new(SmsSender))
    .expect("sms sender registered twice");

  let email = resolve!(trait MessageSender, "email");
  let sms = resolve!(trait MessageSender, "sms");
  let first = email.send("ops@example.com", "Hello from Trellis!");
  let second = sms.send("+123456789", "Hello from Trellis!");
  println!("{}", first);
  println!("{}", second);
  assert!(first.contains("email"));
  assert!(second.contains("SMS"));

  // --- Binding a constructor parameter to a qualifier ---
  let container = Container::new();
  container
    .add_singleton_trait_with_name::<dyn MessageSender>("email", || Arc::new(EmailSender))
    .expect("registration failed");
  container
    .add_singleton_trait_with_name::<dyn MessageSender>("sms", || Arc::new(SmsSender))
    .expect("registration failed");
  container
    .register(Registration::component(Blueprint::<OnCallPager>::new().constructor(
      "new",
      vec![ParameterSpec::of::<dyn MessageSender>().qualified("sms")],
      |args| {
        Ok(OnCallPager {
          sender: args.component::<dyn MessageSender>(0)?,
        })
      },
    )))
    .expect("registration failed");

  let pager = container
    .get::<OnCallPager>(None)
    .expect("resolution failed")
    .expect("pager is registered");
  let page = pager.sender.send("on-call", "disk almost full");
  println!("{}", page);
  assert!(page.contains("SMS"));
}
