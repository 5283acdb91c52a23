//! Runtime value model.
//!
//! An [`Object`] is a reference-counted, internally mutable value with
//! its runtime [`Type`] attached. The same object may be reached through
//! several variables (aliasing through assignment and argument binding),
//! and built-in assignment methods mutate it in place so every alias
//! observes the change.

use super::env::EnvRef;
use super::types::Type;
use crate::ast::{Expansion, Node};
use crate::error::Diagnostic;
use crate::lexer::Span;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Shared handle to a runtime value.
#[derive(Debug, Clone)]
pub struct Object(Rc<RefCell<ObjectData>>);

#[derive(Debug)]
pub struct ObjectData {
    pub value: Value,
    pub ty: Type,
}

impl Object {
    pub fn new(value: Value, ty: Type) -> Self {
        Self(Rc::new(RefCell::new(ObjectData { value, ty })))
    }

    /// A clone of the current value.
    pub fn value(&self) -> Value {
        self.0.borrow().value.clone()
    }

    pub fn ty(&self) -> Type {
        self.0.borrow().ty.clone()
    }

    pub fn data(&self) -> Ref<'_, ObjectData> {
        self.0.borrow()
    }

    /// Replace value and type in place. Every alias sees the change.
    pub fn set(&self, value: Value, ty: Type) {
        let mut data = self.0.borrow_mut();
        data.value = value;
        data.ty = ty;
    }
}

/// The variants a runtime value can take.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Float(f64),
    Bool(bool),
    Str(String),
    /// A first-class type handle, e.g. the value of the name `int`.
    TypeValue(Type),
    Function(Function),
    Void,
    /// Reserved for class bodies, which do not evaluate yet.
    ClassInstance(Type),
}

/// A callable: declared signature plus either an AST body or a native
/// implementation.
#[derive(Clone)]
pub struct Function {
    pub return_type: Option<Type>,
    pub parameters: Vec<Parameter>,
    pub body: FunctionBody,
}

/// A resolved declared parameter. The default expression stays as AST and
/// is evaluated at the call site when the argument is missing.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: Option<Type>,
    pub default: Option<Node>,
    pub expansion: Expansion,
}

/// Native built-in methods read their bound operands from the invocation
/// environment.
pub type NativeFn = Rc<dyn Fn(&EnvRef, Span) -> Result<Object, Diagnostic>>;

#[derive(Clone)]
pub enum FunctionBody {
    Ast(Rc<Vec<Node>>),
    Native(NativeFn),
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("return_type", &self.return_type)
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish()
    }
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::Ast(nodes) => write!(f, "Ast({} nodes)", nodes.len()),
            FunctionBody::Native(_) => write!(f, "Native"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_observe_mutation() {
        let int = Type::new("int");
        let object = Object::new(Value::Int(1), int.clone());
        let alias = object.clone();

        object.set(Value::Int(7), int);
        assert!(matches!(alias.value(), Value::Int(7)));
    }

    #[test]
    fn type_travels_with_the_object() {
        let int = Type::new("int");
        let float = Type::new("float");
        let object = Object::new(Value::Int(1), int.clone());
        assert_eq!(object.ty(), int);

        object.set(Value::Float(1.0), float.clone());
        assert_eq!(object.ty(), float);
        assert_ne!(object.ty(), int);
    }
}
