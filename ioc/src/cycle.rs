//! Cyclic dependency detection.

use crate::error::{Error, Result};
use crate::key::ComponentKey;
use std::cell::RefCell;
use std::thread::LocalKey;

struct Frame {
  container: usize,
  key: ComponentKey,
}

type Stack = RefCell<Vec<Frame>>;

thread_local! {
  // Components currently under construction on this thread, outermost first.
  static CONSTRUCTION_STACK: Stack = const { RefCell::new(Vec::new()) };
  // Components currently being verified on this thread.
  static VERIFYING_STACK: Stack = const { RefCell::new(Vec::new()) };
}

/// An RAII guard marking a component as under construction.
///
/// Entering a component that is already on this thread's stack means the
/// dependency graph loops back on itself; the error carries the full path,
/// e.g. `[A, B, A]`. Dropping the guard pops the frame, including while
/// unwinding.
pub(crate) struct CycleGuard {
  stack: &'static LocalKey<Stack>,
  depth: usize,
}

impl CycleGuard {
  pub(crate) fn enter(container: usize, key: &ComponentKey) -> Result<Self> {
    Self::push(&CONSTRUCTION_STACK, container, key)
  }

  /// Like [`enter`](Self::enter), on the separate verification stack.
  pub(crate) fn verifying(container: usize, key: &ComponentKey) -> Result<Self> {
    Self::push(&VERIFYING_STACK, container, key)
  }

  fn push(local: &'static LocalKey<Stack>, container: usize, key: &ComponentKey) -> Result<Self> {
    local.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(start) = stack
        .iter()
        .position(|frame| frame.container == container && frame.key == *key)
      {
        let mut path: Vec<ComponentKey> = stack[start..].iter().map(|frame| frame.key.clone()).collect();
        path.push(key.clone());
        return Err(Error::Cyclic { path });
      }
      stack.push(Frame {
        container,
        key: key.clone(),
      });
      Ok(Self {
        stack: local,
        depth: stack.len(),
      })
    })
  }
}

impl Drop for CycleGuard {
  fn drop(&mut self) {
    self.stack.with(|stack| {
      stack.borrow_mut().truncate(self.depth - 1);
    });
  }
}
