//! Lifecycle states, transitions and the component-side `Lifecycle` trait.

use crate::error::{BoxError, Error, Result};
use crate::instance::Instance;
use crate::key::ComponentKey;
use crate::monitor::ComponentMonitor;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// State of a container or of a lifecycle-managing adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  Constructed,
  Started,
  Stopped,
  Disposed,
}

/// An operation that is only valid in some lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Start,
  Stop,
  Dispose,
  AddComponent,
  RemoveComponent,
  AddChild,
}

impl LifecycleState {
  pub fn is_started(&self) -> bool {
    matches!(self, LifecycleState::Started)
  }

  pub fn is_disposed(&self) -> bool {
    matches!(self, LifecycleState::Disposed)
  }

  /// The state `attempted` leads to, or `None` if it is not allowed from here.
  ///
  /// `Disposed` is terminal. Disposing a started container is refused: it has
  /// to be stopped first. Components can be removed only while not started;
  /// components and children can be added in any state but `Disposed`.
  pub fn next(self, attempted: Transition) -> Option<LifecycleState> {
    use LifecycleState::*;
    match (self, attempted) {
      (Disposed, _) => None,
      (Constructed | Stopped, Transition::Start) => Some(Started),
      (Started, Transition::Stop) => Some(Stopped),
      (Constructed | Stopped, Transition::Dispose) => Some(Disposed),
      (Started, Transition::RemoveComponent) => None,
      (state, Transition::AddComponent | Transition::RemoveComponent | Transition::AddChild) => Some(state),
      _ => None,
    }
  }
}

impl fmt::Display for LifecycleState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      LifecycleState::Constructed => "constructed",
      LifecycleState::Started => "started",
      LifecycleState::Stopped => "stopped",
      LifecycleState::Disposed => "disposed",
    })
  }
}

impl fmt::Display for Transition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Transition::Start => "start",
      Transition::Stop => "stop",
      Transition::Dispose => "dispose",
      Transition::AddComponent => "add a component to",
      Transition::RemoveComponent => "remove a component from",
      Transition::AddChild => "add a child to",
    })
  }
}

/// Applies `attempted` to `state`, returning the previous state.
pub(crate) fn advance(
  state: &Mutex<LifecycleState>,
  target: impl FnOnce() -> String,
  attempted: Transition,
) -> Result<LifecycleState> {
  let mut state = state.lock();
  let current = *state;
  match current.next(attempted) {
    Some(next) => {
      *state = next;
      Ok(current)
    }
    None => Err(Error::Lifecycle {
      target: target(),
      current,
      attempted,
    }),
  }
}

/// Implemented by components that want start/stop/dispose callbacks.
///
/// Callbacks take `&self` because instances are shared; use interior
/// mutability for any state they change.
pub trait Lifecycle: Send + Sync {
  fn start(&self) -> Result<(), BoxError> {
    Ok(())
  }

  fn stop(&self) -> Result<(), BoxError> {
    Ok(())
  }

  fn dispose(&self) -> Result<(), BoxError> {
    Ok(())
  }
}

type LifecycleCast = Arc<dyn Fn(&Instance) -> Option<Arc<dyn Lifecycle>> + Send + Sync>;

/// Recovers the [`Lifecycle`] view of an instance produced by an adapter.
#[derive(Clone)]
pub struct LifecycleHook {
  cast: LifecycleCast,
}

impl LifecycleHook {
  pub fn of<T: Lifecycle + Any>() -> Self {
    Self {
      cast: Arc::new(|instance: &Instance| {
        instance
          .downcast::<T>()
          .map(|component| component as Arc<dyn Lifecycle>)
      }),
    }
  }

  /// Runs the callback for `phase` on `instance`. Instances the hook cannot
  /// view as `Lifecycle` are left alone.
  pub fn invoke(&self, instance: &Instance, phase: Transition) -> Result<(), BoxError> {
    let Some(component) = (self.cast)(instance) else {
      return Ok(());
    };
    match phase {
      Transition::Start => component.start(),
      Transition::Stop => component.stop(),
      Transition::Dispose => component.dispose(),
      Transition::AddComponent | Transition::RemoveComponent | Transition::AddChild => Ok(()),
    }
  }
}

/// Runs one lifecycle callback and reports it to `monitor`.
pub(crate) fn run_phase(
  hook: &LifecycleHook,
  instance: &Instance,
  key: &ComponentKey,
  container: &str,
  phase: Transition,
  monitor: &dyn ComponentMonitor,
) -> Result<()> {
  match hook.invoke(instance, phase) {
    Ok(()) => {
      monitor.lifecycle_invoked(container, key, phase);
      Ok(())
    }
    Err(source) => {
      let err = Error::from_lifecycle(source, key, phase);
      monitor.lifecycle_failed(container, key, phase, &err);
      Err(err)
    }
  }
}

impl fmt::Debug for LifecycleHook {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("LifecycleHook")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transitions_follow_the_state_machine() {
    use LifecycleState::*;
    assert_eq!(Constructed.next(Transition::Start), Some(Started));
    assert_eq!(Started.next(Transition::Start), None);
    assert_eq!(Started.next(Transition::Stop), Some(Stopped));
    assert_eq!(Stopped.next(Transition::Start), Some(Started));
    assert_eq!(Constructed.next(Transition::Stop), None);
    assert_eq!(Started.next(Transition::Dispose), None);
    assert_eq!(Stopped.next(Transition::Dispose), Some(Disposed));
    assert_eq!(Disposed.next(Transition::Start), None);
    assert_eq!(Disposed.next(Transition::Dispose), None);
    assert_eq!(Started.next(Transition::RemoveComponent), None);
    assert_eq!(Stopped.next(Transition::RemoveComponent), Some(Stopped));
    assert_eq!(Started.next(Transition::AddChild), Some(Started));
    assert_eq!(Started.next(Transition::AddComponent), Some(Started));
    assert_eq!(Disposed.next(Transition::AddComponent), None);
    assert_eq!(Disposed.next(Transition::AddChild), None);
  }

  #[test]
  fn advance_reports_current_and_attempted() {
    let state = Mutex::new(LifecycleState::Constructed);
    let err = advance(&state, || "container 'root'".to_string(), Transition::Stop).unwrap_err();
    match err {
      Error::Lifecycle {
        target,
        current,
        attempted,
      } => {
        assert_eq!(target, "container 'root'");
        assert_eq!(current, LifecycleState::Constructed);
        assert_eq!(attempted, Transition::Stop);
      }
      other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*state.lock(), LifecycleState::Constructed);
  }
}
