//! Registry keys derived from static types.
//!
//! A [`ShapeKey`] is the identity of a request, notification or behavior type.
//! Equality and hashing use only the [`TypeId`]; the type name is carried along
//! for error messages and log fields.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Copy)]
pub struct ShapeKey {
    id: TypeId,
    name: &'static str,
}

impl ShapeKey {
    /// Shape of `T`. Works for unsized types so trait objects can report
    /// the shape of the concrete type behind them.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without the module path of its outermost path segment,
    /// e.g. `GetProductById` or `Vec<alloc::string::String>`. Tuples,
    /// arrays, references and trait objects keep their full name.
    pub fn short_name(&self) -> &'static str {
        let end = self
            .name
            .find(['<', '(', '[', '&', '*', ';', ' '])
            .unwrap_or(self.name.len());
        match self.name[..end].rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for ShapeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ShapeKey {}

impl Hash for ShapeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShapeKey").field(&self.name).finish()
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
