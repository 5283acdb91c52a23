//! Runtime: value model, scope chain, built-in types, and the
//! tree-walking evaluator.

mod builtins;
mod env;
#[allow(clippy::module_inception)]
mod interpreter;
mod object;
mod types;

pub use builtins::bootstrap;
pub use env::{Environment, EnvRef, Variable, declare, declared_locally, insert, lookup};
pub use interpreter::{CallFrame, ReturnReason, interpret};
pub use object::{Function, FunctionBody, NativeFn, Object, Parameter, Value};
pub use types::{Member, Type, TypeDefinition};
