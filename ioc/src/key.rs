//! Type tokens and component keys.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A runtime token for a Rust type.
///
/// Works for unsized types as well, so `TypeToken::of::<dyn Greeter>()` is a
/// valid token. Equality and hashing only consider the `TypeId`; the type name
/// is carried along for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeToken {
  id: TypeId,
  name: &'static str,
}

impl TypeToken {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: type_name::<T>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn is<T: ?Sized + Any>(&self) -> bool {
    self.id == TypeId::of::<T>()
  }
}

impl PartialEq for TypeToken {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeToken({})", self.name)
  }
}

impl fmt::Display for TypeToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// Identifies one registration inside a container.
///
/// Keys are unique per container: registering the same key twice is an error.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ComponentKey {
  /// Keyed by the component's type.
  Type(TypeToken),
  /// Keyed by a type plus a qualifier (a "binding").
  Qualified { token: TypeToken, qualifier: String },
  /// Keyed by an arbitrary name.
  Named(String),
}

impl ComponentKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    ComponentKey::Type(TypeToken::of::<T>())
  }

  pub fn qualified<T: ?Sized + Any>(qualifier: impl Into<String>) -> Self {
    ComponentKey::Qualified {
      token: TypeToken::of::<T>(),
      qualifier: qualifier.into(),
    }
  }

  pub fn named(name: impl Into<String>) -> Self {
    ComponentKey::Named(name.into())
  }

  /// The type this key is bound to, if any. `Named` keys carry no type.
  pub fn token(&self) -> Option<TypeToken> {
    match self {
      ComponentKey::Type(token) | ComponentKey::Qualified { token, .. } => Some(*token),
      ComponentKey::Named(_) => None,
    }
  }

  /// The textual part of the key used for name-hint matching.
  pub fn name(&self) -> Option<&str> {
    match self {
      ComponentKey::Type(_) => None,
      ComponentKey::Qualified { qualifier, .. } => Some(qualifier),
      ComponentKey::Named(name) => Some(name),
    }
  }
}

impl From<&str> for ComponentKey {
  fn from(name: &str) -> Self {
    ComponentKey::Named(name.to_owned())
  }
}

impl From<String> for ComponentKey {
  fn from(name: String) -> Self {
    ComponentKey::Named(name)
  }
}

impl From<TypeToken> for ComponentKey {
  fn from(token: TypeToken) -> Self {
    ComponentKey::Type(token)
  }
}

impl From<&ComponentKey> for ComponentKey {
  fn from(key: &ComponentKey) -> Self {
    key.clone()
  }
}

impl fmt::Debug for ComponentKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ComponentKey::Type(token) => write!(f, "Key({})", token),
      ComponentKey::Qualified { token, qualifier } => {
        write!(f, "Key({}, Qualifier({}))", token, qualifier)
      }
      ComponentKey::Named(name) => write!(f, "Key({:?})", name),
    }
  }
}

impl fmt::Display for ComponentKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ComponentKey::Type(token) => write!(f, "{}", token),
      ComponentKey::Qualified { token, qualifier } => write!(f, "{}@{}", token, qualifier),
      ComponentKey::Named(name) => write!(f, "{:?}", name),
    }
  }
}
