use crate::key::{ComponentKey, TypeToken};
use crate::lifecycle::{LifecycleState, Transition};
use std::fmt;
use thiserror::Error;

/// Error type user-supplied constructors, members, factories and lifecycle
/// callbacks return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One competing registration reported by [`Error::Ambiguous`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
  pub key: ComponentKey,
  pub implementation: &'static str,
}

impl fmt::Display for Candidate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.key, self.implementation)
  }
}

/// The main error type for `trellis_ioc`.
#[derive(Debug, Error)]
pub enum Error {
  // --- Composition ---
  #[error("Duplicate component key {key} in container '{container}'")]
  DuplicateKey { key: ComponentKey, container: String },

  #[error(
    "{implementation} has unsatisfied dependencies [{}] in container '{container}'",
    joined(.unsatisfied)
  )]
  Unsatisfiable {
    implementation: &'static str,
    unsatisfied: Vec<TypeToken>,
    container: String,
  },

  #[error(
    "Ambiguous resolution of {expected} in container '{container}': candidates [{}]",
    joined(.candidates)
  )]
  Ambiguous {
    expected: TypeToken,
    candidates: Vec<Candidate>,
    container: String,
  },

  #[error("Cyclic dependency detected: {}", cycle_path(.path))]
  Cyclic { path: Vec<ComponentKey> },

  #[error("Component {key} ({implementation}) is not compatible with {expected}")]
  TypeIncompatible {
    key: ComponentKey,
    expected: TypeToken,
    implementation: &'static str,
  },

  #[error(
    "{implementation} has more than one satisfiable constructor with {arity} parameter(s) in container '{container}'"
  )]
  TooManyConstructors {
    implementation: &'static str,
    arity: usize,
    container: String,
  },

  #[error("{implementation} declares no constructor")]
  NoConstructor { implementation: &'static str },

  #[error("{implementation} needs a zero-argument constructor for member injection")]
  NoDefaultConstructor { implementation: &'static str },

  #[error("Guard {guard} for component {key} is not registered")]
  GuardMissing { guard: ComponentKey, key: ComponentKey },

  #[error("Guard {guard} rejected instantiation of component {key}")]
  GuardRejected { guard: ComponentKey, key: ComponentKey },

  #[error("Cannot convert {value:?} to {target}: {reason}")]
  Conversion {
    target: TypeToken,
    value: String,
    reason: String,
  },

  #[error("Argument {index} of '{member}' is not a {expected}")]
  ArgumentMismatch {
    member: String,
    index: usize,
    expected: &'static str,
  },

  // --- Lifecycle ---
  #[error("Cannot {attempted} {target} while it is {current}")]
  Lifecycle {
    target: String,
    current: LifecycleState,
    attempted: Transition,
  },

  // --- Invocation ---
  #[error("Invoking '{member}' on {implementation} failed: {source}")]
  Invocation {
    implementation: &'static str,
    member: String,
    #[source]
    source: BoxError,
  },

  #[error("Lifecycle callback '{phase}' of component {key} failed: {source}")]
  LifecycleInvocation {
    key: ComponentKey,
    phase: Transition,
    #[source]
    source: BoxError,
  },

  // --- Verification ---
  #[error("Verification failed with {} error(s): [{}]", .0.len(), joined(.0))]
  Verification(Vec<Error>),

  // --- Configuration ---
  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidConfigValue { field: String, message: String },
}

impl Error {
  /// Maps an error returned by user code invoked on `implementation`.
  ///
  /// Errors of this crate (a nested resolution failure, say) pass through
  /// unchanged; anything else is wrapped with the member it came from.
  pub(crate) fn from_invocation(source: BoxError, implementation: &'static str, member: &str) -> Self {
    match source.downcast::<Error>() {
      Ok(err) => *err,
      Err(source) => Error::Invocation {
        implementation,
        member: member.to_owned(),
        source,
      },
    }
  }

  /// `true` for errors meaning "this way of building the component does not
  /// work here", as opposed to a failure while trying.
  pub(crate) fn is_unsatisfied(&self) -> bool {
    matches!(
      self,
      Error::Unsatisfiable { .. } | Error::NoConstructor { .. } | Error::NoDefaultConstructor { .. }
    )
  }

  pub(crate) fn from_lifecycle(source: BoxError, key: &ComponentKey, phase: Transition) -> Self {
    match source.downcast::<Error>() {
      Ok(err) => *err,
      Err(source) => Error::LifecycleInvocation {
        key: key.clone(),
        phase,
        source,
      },
    }
  }
}

fn joined<T: fmt::Display>(items: &[T]) -> String {
  items
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}

fn cycle_path(keys: &[ComponentKey]) -> String {
  keys
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(" -> ")
}

/// A specialized `Result` type for `trellis_ioc` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
