//! # Trellis IoC
//!
//! A thread-safe Inversion of Control (IoC) container that assembles object
//! graphs on demand.
//!
//! Components are registered under keys and described by a [`Blueprint`]:
//! the constructors, fields, setters and injection methods the container may
//! call, and what each of them needs. When a component is requested the
//! container resolves those needs from its registry, from parent containers,
//! from constants or by aggregating every matching component, and builds the
//! whole dependency tree.
//!
//! ## Core Concepts
//!
//! - **Container**: the registry. Containers form a hierarchy; children fall
//!   back to their parent, tiered children only to their direct parent.
//! - **Adapters**: produce instances for one key. Injectors build instances;
//!   behaviors such as [`behaviors::Cached`] or [`behaviors::Locked`] wrap
//!   them.
//! - **Parameters**: decide how one argument is satisfied.
//! - **Lifecycle**: containers and cached components are started, stopped
//!   and disposed together.
//! - **Global Container**: a process-wide container behind [`global()`] and
//!   the [`resolve!`] family of macros.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use trellis_ioc::{Blueprint, Container, Injectable, ParameterSpec};
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     "Hello, World!".to_string()
//!   }
//! }
//!
//! impl Injectable for EnglishGreeter {
//!   fn blueprint() -> Blueprint<Self> {
//!     Blueprint::new()
//!       .default_constructor(|| EnglishGreeter)
//!       .facet::<dyn Greeter>(|greeter| greeter)
//!   }
//! }
//!
//! struct Welcome {
//!   greeter: Arc<dyn Greeter>,
//! }
//!
//! impl Injectable for Welcome {
//!   fn blueprint() -> Blueprint<Self> {
//!     Blueprint::new().constructor("new", vec![ParameterSpec::of::<dyn Greeter>()], |args| {
//!       Ok(Welcome {
//!         greeter: args.component::<dyn Greeter>(0)?,
//!       })
//!     })
//!   }
//! }
//!
//! let container = Container::new();
//! container.add_component::<EnglishGreeter>().unwrap();
//! container.add_component::<Welcome>().unwrap();
//!
//! let welcome = container.get::<Welcome>(None).unwrap().unwrap();
//! assert_eq!(welcome.greeter.greet(), "Hello, World!");
//! ```

mod adapter;
pub mod behaviors;
mod blueprint;
pub mod config;
mod container;
mod convert;
mod cycle;
mod error;
mod global;
pub mod injectors;
mod instance;
mod key;
mod lifecycle;
#[doc(hidden)]
pub mod macros;
mod monitor;
mod parameter;
mod registration;
mod visitor;

pub use adapter::{AdapterRef, ComponentAdapter};
pub use blueprint::{Argument, Arguments, Blueprint, Constructor, Injectable, Member, MemberKind, ParameterSpec, Shape};
pub use config::{find_config_file, find_config_file_in, ContainerConfig};
pub use container::Container;
pub use convert::Converters;
pub use error::{BoxError, Candidate, Error, Result};
pub use global::global;
pub use injectors::{Injection, Provider};
pub use instance::{Facet, Instance};
pub use key::{ComponentKey, TypeToken};
pub use lifecycle::{Lifecycle, LifecycleHook, LifecycleState, Transition};
pub use monitor::{ComponentMonitor, MonitorRef, NullMonitor, TracingMonitor};
pub use parameter::{
  CollectionParameter, ComponentParameter, ConstantParameter, DefaultConstructorParameter, NullParameter, Parameter,
  ParameterRef, ParameterRequest, Resolution,
};
pub use registration::{Characteristics, Defaults, Registration};
pub use visitor::{ContainerVisitor, DescribingVisitor, VerifyingVisitor};
