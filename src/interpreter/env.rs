//! Scope chain for the interpreter.
//!
//! An [`Environment`] maps names to variables and links to its parent
//! scope; lookup walks up the chain. Environments are reference counted
//! because closures and bound objects can keep a scope alive after its
//! creator returns.

use super::object::Object;
use crate::ast::Qualifiers;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to an environment.
pub type EnvRef = Rc<RefCell<Environment>>;

/// A declared name: its object plus declaration qualifiers.
#[derive(Debug, Clone)]
pub struct Variable {
    pub object: Object,
    pub qualifiers: Qualifiers,
}

impl Variable {
    pub fn plain(object: Object) -> Self {
        Self {
            object,
            qualifiers: Qualifiers::empty(),
        }
    }
}

/// One scope: a name table and an optional parent link.
#[derive(Debug)]
pub struct Environment {
    parent: Option<EnvRef>,
    variables: FxHashMap<String, Variable>,
}

impl Environment {
    /// A root scope with no parent.
    pub fn root() -> EnvRef {
        Rc::new(RefCell::new(Self {
            parent: None,
            variables: FxHashMap::default(),
        }))
    }

    /// A child scope of `parent`.
    pub fn child_of(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self {
            parent: Some(parent.clone()),
            variables: FxHashMap::default(),
        }))
    }
}

/// Walk the scope chain for a name.
pub fn lookup(env: &EnvRef, name: &str) -> Option<Variable> {
    let mut current = env.clone();
    loop {
        if let Some(variable) = current.borrow().variables.get(name) {
            return Some(variable.clone());
        }
        let parent = current.borrow().parent.clone();
        match parent {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Whether a name is declared in the innermost scope, ignoring parents.
pub fn declared_locally(env: &EnvRef, name: &str) -> bool {
    env.borrow().variables.contains_key(name)
}

/// Declare a name in the innermost scope. Returns false if the name is
/// already declared there; shadowing an outer scope is fine.
pub fn declare(env: &EnvRef, name: String, variable: Variable) -> bool {
    let mut env = env.borrow_mut();
    if env.variables.contains_key(&name) {
        return false;
    }
    env.variables.insert(name, variable);
    true
}

/// Insert or replace a name in the innermost scope, bypassing the
/// redeclaration check. Used for operand and loop-variable binding.
pub fn insert(env: &EnvRef, name: String, variable: Variable) {
    env.borrow_mut().variables.insert(name, variable);
}
