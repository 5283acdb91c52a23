//! Runtime type model.
//!
//! A [`Type`] is a shared handle to a [`TypeDefinition`]; two types are
//! equal iff they point at the identical definition (nominal equality).
//! Method dispatch reads the definition's member table.

use super::object::Object;
use crate::ast::Qualifiers;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A named runtime type with its method table.
pub struct TypeDefinition {
    pub name: String,
    pub members: FxHashMap<String, Member>,
}

/// A value plus qualifiers, stored in a type's member table. Used
/// uniformly for operator methods and future class fields.
#[derive(Debug, Clone)]
pub struct Member {
    pub object: Object,
    pub qualifiers: Qualifiers,
}

/// Shared handle to a [`TypeDefinition`].
#[derive(Clone)]
pub struct Type(Rc<RefCell<TypeDefinition>>);

impl Type {
    /// Create a fresh type with an empty member table.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(TypeDefinition {
            name: name.into(),
            members: FxHashMap::default(),
        })))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Insert or replace a member.
    pub fn insert_member(&self, name: impl Into<String>, object: Object, qualifiers: Qualifiers) {
        self.0.borrow_mut().members.insert(
            name.into(),
            Member {
                object,
                qualifiers,
            },
        );
    }

    pub fn member(&self, name: &str) -> Option<Member> {
        self.0.borrow().members.get(name).cloned()
    }
}

impl PartialEq for Type {
    /// Identity, not structure.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.0.borrow().name)
    }
}
