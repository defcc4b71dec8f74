use super::{unsatisfiable, Injection, Plan, Target};
use crate::adapter::ComponentAdapter;
use crate::blueprint::{Blueprint, Constructor, Member, MemberKind};
use crate::container::Container;
use crate::cycle::CycleGuard;
use crate::error::{Error, Result};
use crate::instance::{Facet, Instance};
use crate::key::{ComponentKey, TypeToken};
use crate::lifecycle::LifecycleHook;
use crate::monitor::{MonitorRef, MonitorSlot};
use crate::parameter::ParameterRef;
use std::any::{type_name, Any};
use std::time::Instant;

/// Builds instances of `T` from its [`Blueprint`].
pub struct Injector<T> {
  key: ComponentKey,
  blueprint: Blueprint<T>,
  injection: Injection,
  parameters: Option<Vec<ParameterRef>>,
  use_names: bool,
  allow_empty: bool,
  monitor: MonitorSlot,
}

/// A fully resolved way to build a `T`.
struct Prepared<'a, T> {
  constructor: &'a Constructor<T>,
  arguments: Plan,
  members: Vec<(&'a Member<T>, Plan)>,
}

impl<T: Any + Send + Sync> Injector<T> {
  pub fn new(
    key: ComponentKey,
    blueprint: Blueprint<T>,
    injection: Injection,
    parameters: Option<Vec<ParameterRef>>,
    use_names: bool,
    allow_empty: bool,
  ) -> Self {
    Self {
      key,
      blueprint,
      injection,
      parameters,
      use_names,
      allow_empty,
      monitor: MonitorSlot::new(),
    }
  }

  pub fn injection(&self) -> &Injection {
    &self.injection
  }

  fn target(&self) -> Target<'_> {
    Target {
      key: &self.key,
      implementation: type_name::<T>(),
      use_names: self.use_names,
      allow_empty: self.allow_empty,
    }
  }

  fn prepare(&self, container: &Container, injection: &Injection) -> Result<Prepared<'_, T>> {
    match injection {
      Injection::Constructor => {
        let (constructor, arguments) = self.choose_constructor(container)?;
        Ok(Prepared {
          constructor,
          arguments,
          members: Vec::new(),
        })
      }
      Injection::Field => self.prepare_members(container, Some(MemberKind::Field)),
      Injection::Setter => self.prepare_members(container, Some(MemberKind::Setter)),
      Injection::Method => self.prepare_members(container, Some(MemberKind::Method)),
      Injection::Adaptive => {
        let (constructor, arguments) = self.choose_constructor(container)?;
        let members = self.plan_members(container, None)?;
        Ok(Prepared {
          constructor,
          arguments,
          members,
        })
      }
      Injection::Composite(strategies) => {
        let mut last = None;
        for strategy in strategies {
          match self.prepare(container, strategy) {
            Ok(prepared) => return Ok(prepared),
            Err(err) if err.is_unsatisfied() => last = Some(err),
            Err(err) => return Err(err),
          }
        }
        Err(last.unwrap_or_else(|| unsatisfiable(container, type_name::<T>(), Vec::new())))
      }
    }
  }

  /// Zero-argument constructor plus the members of `kind`.
  fn prepare_members(&self, container: &Container, kind: Option<MemberKind>) -> Result<Prepared<'_, T>> {
    let constructor = self.blueprint.zero_arg_constructor()?;
    let members = self.plan_members(container, kind)?;
    Ok(Prepared {
      constructor,
      arguments: Plan::empty(),
      members,
    })
  }

  fn plan_members(&self, container: &Container, kind: Option<MemberKind>) -> Result<Vec<(&Member<T>, Plan)>> {
    let mut planned = Vec::new();
    let mut unsatisfied = Vec::new();
    for member in self.blueprint.members() {
      if kind.is_some_and(|kind| member.kind() != kind) {
        continue;
      }
      let plan = Plan::resolve(container, self.target(), member.params(), None)?;
      unsatisfied.extend_from_slice(plan.unsatisfied());
      planned.push((member, plan));
    }
    if unsatisfied.is_empty() {
      Ok(planned)
    } else {
      Err(unsatisfiable(container, type_name::<T>(), unsatisfied))
    }
  }

  /// The satisfiable constructor with the most parameters.
  ///
  /// With pinned parameters only constructors of the same arity compete;
  /// a default-constructor marker selects the zero-argument one.
  fn choose_constructor(&self, container: &Container) -> Result<(&Constructor<T>, Plan)> {
    let constructors = self.blueprint.constructors();
    if constructors.is_empty() {
      return Err(Error::NoConstructor {
        implementation: type_name::<T>(),
      });
    }

    let pinned = self.parameters.as_deref();
    if pinned.is_some_and(|pinned| pinned.iter().any(|parameter| parameter.pins_default_constructor())) {
      return Ok((self.blueprint.zero_arg_constructor()?, Plan::empty()));
    }

    let mut candidates: Vec<&Constructor<T>> = constructors
      .iter()
      .filter(|constructor| pinned.map_or(true, |pinned| pinned.len() == constructor.params().len()))
      .collect();
    candidates.sort_by(|a, b| b.params().len().cmp(&a.params().len()));

    let mut chosen: Option<(&Constructor<T>, Plan)> = None;
    let mut unsatisfied = Vec::new();
    for constructor in candidates {
      let arity = constructor.params().len();
      if let Some((best, _)) = &chosen {
        if arity < best.params().len() {
          break;
        }
      }
      let plan = Plan::resolve(container, self.target(), constructor.params(), pinned)?;
      if !plan.is_satisfied() {
        unsatisfied.extend_from_slice(plan.unsatisfied());
        continue;
      }
      if chosen.is_some() {
        return Err(Error::TooManyConstructors {
          implementation: type_name::<T>(),
          arity,
          container: container.name().to_owned(),
        });
      }
      chosen = Some((constructor, plan));
    }
    chosen.ok_or_else(|| unsatisfiable(container, type_name::<T>(), unsatisfied))
  }

  fn build(&self, container: &Container, prepared: Prepared<'_, T>) -> Result<Instance> {
    let monitor = self.monitor.get();
    let implementation = type_name::<T>();
    let constructor = prepared.constructor;

    let args = prepared.arguments.arguments(constructor.name())?;
    monitor.instantiating(container.name(), &self.key, constructor.name());
    let started = Instant::now();
    let mut value = match constructor.invoke(&args) {
      Ok(value) => value,
      Err(source) => {
        let err = Error::from_invocation(source, implementation, constructor.name());
        monitor.instantiation_failed(container.name(), &self.key, constructor.name(), &err);
        return Err(err);
      }
    };
    monitor.instantiated(container.name(), &self.key, constructor.name(), started.elapsed());

    for (member, plan) in &prepared.members {
      let args = plan.arguments(member.name())?;
      monitor.invoking(container.name(), &self.key, member.name());
      let started = Instant::now();
      member
        .invoke(&mut value, &args)
        .map_err(|source| Error::from_invocation(source, implementation, member.name()))?;
      monitor.invoked(container.name(), &self.key, member.name(), started.elapsed());
    }
    Ok(Instance::new(value))
  }
}

impl<T: Any + Send + Sync> ComponentAdapter for Injector<T> {
  fn key(&self) -> &ComponentKey {
    &self.key
  }

  fn implementation(&self) -> TypeToken {
    TypeToken::of::<T>()
  }

  fn get_instance(&self, container: &Container) -> Result<Instance> {
    let _guard = CycleGuard::enter(container.id(), &self.key)?;
    let prepared = self.prepare(container, &self.injection)?;
    self.build(container, prepared)
  }

  fn facets(&self) -> &[Facet] {
    self.blueprint.facets()
  }

  fn parameters(&self) -> &[ParameterRef] {
    self.parameters.as_deref().unwrap_or(&[])
  }

  fn lifecycle_hook(&self) -> Option<&LifecycleHook> {
    self.blueprint.lifecycle()
  }

  fn verify(&self, container: &Container) -> Result<()> {
    let _guard = CycleGuard::verifying(container.id(), &self.key)?;
    let prepared = self.prepare(container, &self.injection)?;
    let pinned = self.parameters.as_deref();
    Plan::verify(container, self.target(), prepared.constructor.params(), pinned)?;
    for (member, _) in &prepared.members {
      Plan::verify(container, self.target(), member.params(), None)?;
    }
    Ok(())
  }

  fn change_monitor(&self, monitor: MonitorRef) {
    self.monitor.set(monitor);
  }

  fn descriptor(&self) -> String {
    format!("{}[{}]", self.injection, self.key)
  }
}
