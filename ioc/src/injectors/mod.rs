//! Injectors: the adapters that actually produce instances.

mod factory;
mod injector;
mod instance;
mod provider;

pub use factory::FactoryAdapter;
pub use injector::Injector;
pub use instance::InstanceAdapter;
pub use provider::{Provider, ProviderAdapter};

use crate::blueprint::{Arguments, ParameterSpec};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::key::{ComponentKey, TypeToken};
use crate::parameter::{ComponentParameter, Parameter, ParameterRef, ParameterRequest, Resolution};
use std::fmt;

/// How an [`Injector`] applies resolved dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Injection {
  /// The greediest satisfiable constructor.
  Constructor,
  /// Zero-argument constructor, then every declared field.
  Field,
  /// Zero-argument constructor, then every declared setter.
  Setter,
  /// Zero-argument constructor, then every declared injection method.
  Method,
  /// Constructor injection followed by all declared members.
  #[default]
  Adaptive,
  /// The first strategy whose dependencies are all satisfiable.
  Composite(Vec<Injection>),
}

impl fmt::Display for Injection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Injection::Constructor => f.write_str("ConstructorInjection"),
      Injection::Field => f.write_str("FieldInjection"),
      Injection::Setter => f.write_str("SetterInjection"),
      Injection::Method => f.write_str("MethodInjection"),
      Injection::Adaptive => f.write_str("AdaptiveInjection"),
      Injection::Composite(strategies) => {
        f.write_str("CompositeInjection(")?;
        for (i, strategy) in strategies.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{}", strategy)?;
        }
        f.write_str(")")
      }
    }
  }
}

/// The component whose parameters are being resolved.
#[derive(Clone, Copy)]
pub(crate) struct Target<'a> {
  pub(crate) key: &'a ComponentKey,
  pub(crate) implementation: &'static str,
  pub(crate) use_names: bool,
  pub(crate) allow_empty: bool,
}

impl<'a> Target<'a> {
  fn request(self, container: &Container, spec: &'a ParameterSpec) -> ParameterRequest<'a> {
    ParameterRequest::new(spec)
      .requested_by(container, self.key, self.implementation)
      .use_names(self.use_names)
  }
}

/// Resolutions for one member's parameters, not yet instantiated.
pub(crate) struct Plan {
  resolutions: Vec<Resolution>,
  unsatisfied: Vec<TypeToken>,
}

impl Plan {
  /// Resolves `specs`, using `pinned` parameters positionally where given.
  pub(crate) fn resolve(
    container: &Container,
    target: Target<'_>,
    specs: &[ParameterSpec],
    pinned: Option<&[ParameterRef]>,
  ) -> Result<Self> {
    let fallback = ComponentParameter::with_empty_collections(target.allow_empty);
    let mut resolutions = Vec::with_capacity(specs.len());
    let mut unsatisfied = Vec::new();
    for (index, spec) in specs.iter().enumerate() {
      let request = target.request(container, spec);
      let resolution = match pinned.and_then(|pinned| pinned.get(index)) {
        Some(parameter) => parameter.resolve(container, &request)?,
        None => fallback.resolve(container, &request)?,
      };
      if !resolution.is_resolved() {
        unsatisfied.push(spec.token());
      }
      resolutions.push(resolution);
    }
    Ok(Self {
      resolutions,
      unsatisfied,
    })
  }

  /// Verifies every parameter in `specs` and the components behind them.
  pub(crate) fn verify(
    container: &Container,
    target: Target<'_>,
    specs: &[ParameterSpec],
    pinned: Option<&[ParameterRef]>,
  ) -> Result<()> {
    let fallback = ComponentParameter::with_empty_collections(target.allow_empty);
    for (index, spec) in specs.iter().enumerate() {
      let request = target.request(container, spec);
      match pinned.and_then(|pinned| pinned.get(index)) {
        Some(parameter) => parameter.verify(container, &request)?,
        None => fallback.verify(container, &request)?,
      }
    }
    Ok(())
  }

  pub(crate) fn empty() -> Self {
    Self {
      resolutions: Vec::new(),
      unsatisfied: Vec::new(),
    }
  }

  pub(crate) fn is_satisfied(&self) -> bool {
    self.unsatisfied.is_empty()
  }

  pub(crate) fn unsatisfied(&self) -> &[TypeToken] {
    &self.unsatisfied
  }

  /// Instantiates every argument.
  pub(crate) fn arguments(&self, member: &str) -> Result<Arguments> {
    let values = self
      .resolutions
      .iter()
      .map(Resolution::instantiate)
      .collect::<Result<Vec<_>>>()?;
    Ok(Arguments::new(member, values))
  }
}

pub(crate) fn unsatisfiable(container: &Container, implementation: &'static str, mut unsatisfied: Vec<TypeToken>) -> Error {
  let mut seen = Vec::with_capacity(unsatisfied.len());
  unsatisfied.retain(|token| {
    if seen.contains(token) {
      false
    } else {
      seen.push(*token);
      true
    }
  });
  Error::Unsatisfiable {
    implementation,
    unsatisfied,
    container: container.name().to_owned(),
  }
}
