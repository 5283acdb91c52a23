//! Built-in types and their native operator methods.
//!
//! [`bootstrap`] builds the root `Types` environment exactly once per
//! session: a `TypeDefinition` for each of `void, int, float, bool,
//! string, Type, Function`, each populated with native methods that read
//! their bound `this`/`other` operands from the invocation environment.
//! The interpreter performs strict type-equality checks before dispatch,
//! so each method only has to handle its own value shapes.

use super::env::{Environment, EnvRef, Variable, declare, lookup};
use super::object::{Function, FunctionBody, Object, Value};
use super::types::Type;
use crate::ast::Qualifiers;
use crate::error::Diagnostic;
use crate::lexer::Span;
use std::rc::Rc;

/// Build the root environment with all built-in types registered.
pub fn bootstrap() -> EnvRef {
    let env = Environment::root();

    let type_ty = Type::new("Type");
    let function_ty = Type::new("Function");
    let void = Type::new("void");
    let int = Type::new("int");
    let float = Type::new("float");
    let boolean = Type::new("bool");
    let string = Type::new("string");

    let registry = Registry {
        function_ty: function_ty.clone(),
    };

    register_int(&registry, &int, &boolean);
    register_float(&registry, &float, &boolean);
    register_bool(&registry, &boolean);
    register_string(&registry, &string, &boolean);
    register_type(&registry, &type_ty, &boolean);
    registry.assign(&function_ty);

    for ty in [void, int, float, boolean, string, type_ty.clone(), function_ty] {
        declare(
            &env,
            ty.name(),
            Variable {
                object: Object::new(Value::TypeValue(ty.clone()), type_ty.clone()),
                qualifiers: Qualifiers::CONST,
            },
        );
    }

    env
}

struct Registry {
    function_ty: Type,
}

impl Registry {
    fn method(
        &self,
        ty: &Type,
        name: &str,
        f: impl Fn(&EnvRef, Span) -> Result<Object, Diagnostic> + 'static,
    ) {
        let function = Function {
            return_type: None,
            parameters: Vec::new(),
            body: FunctionBody::Native(Rc::new(f)),
        };
        ty.insert_member(
            name,
            Object::new(Value::Function(function), self.function_ty.clone()),
            Qualifiers::empty(),
        );
    }

    /// `this = other`: copy value and type into the left object in place,
    /// so every alias of the left object observes the assignment.
    fn assign(&self, ty: &Type) {
        self.method(ty, "assign", |env, span| {
            let (this, other) = operands(env, span)?;
            let value = other.value();
            let other_ty = other.ty();
            this.set(value, other_ty);
            Ok(this)
        });
    }
}

fn operand(env: &EnvRef, span: Span, name: &str) -> Result<Object, Diagnostic> {
    lookup(env, name)
        .map(|v| v.object)
        .ok_or_else(|| Diagnostic::operation(span, format!("Missing operand '{name}'")))
}

fn operands(env: &EnvRef, span: Span) -> Result<(Object, Object), Diagnostic> {
    Ok((operand(env, span, "this")?, operand(env, span, "other")?))
}

fn invalid_operands(span: Span) -> Diagnostic {
    Diagnostic::operation(span, "Invalid operands")
}

// =========================================
// int
// =========================================

fn register_int(registry: &Registry, int: &Type, boolean: &Type) {
    int_arith(registry, int, "add", |a, b, _| Ok(a.wrapping_add(b)));
    int_arith(registry, int, "subtract", |a, b, _| Ok(a.wrapping_sub(b)));
    int_arith(registry, int, "multiply", |a, b, _| Ok(a.wrapping_mul(b)));
    int_arith(registry, int, "divide", int_div);
    int_arith(registry, int, "int_divide", int_div);
    int_arith(registry, int, "modulo", |a, b, span| {
        if b == 0 {
            Err(Diagnostic::operation(span, "Division by zero"))
        } else {
            Ok(a.wrapping_rem(b))
        }
    });
    int_arith(registry, int, "pow", |a, b, span| {
        if b < 0 {
            Err(Diagnostic::operation(span, "Negative exponent"))
        } else {
            Ok(a.wrapping_pow(b as u32))
        }
    });
    // Bitwise on integers.
    int_arith(registry, int, "and", |a, b, _| Ok(a & b));
    int_arith(registry, int, "or", |a, b, _| Ok(a | b));

    int_compare(registry, int, boolean, "equal", |a, b| a == b);
    int_compare(registry, int, boolean, "not_equal", |a, b| a != b);
    int_compare(registry, int, boolean, "greater", |a, b| a > b);
    int_compare(registry, int, boolean, "less", |a, b| a < b);
    int_compare(registry, int, boolean, "greater_equal", |a, b| a >= b);
    int_compare(registry, int, boolean, "less_equal", |a, b| a <= b);

    int_assign(registry, int, "add_assign", |a, b, _| Ok(a.wrapping_add(b)));
    int_assign(registry, int, "subtract_assign", |a, b, _| {
        Ok(a.wrapping_sub(b))
    });
    int_assign(registry, int, "multiply_assign", |a, b, _| {
        Ok(a.wrapping_mul(b))
    });
    int_assign(registry, int, "divide_assign", int_div);
    registry.assign(int);

    int_unary(registry, int, "negative", i32::wrapping_neg);
    int_unary(registry, int, "positive", |a| a);
}

fn int_div(a: i32, b: i32, span: Span) -> Result<i32, Diagnostic> {
    if b == 0 {
        Err(Diagnostic::operation(span, "Division by zero"))
    } else {
        Ok(a.wrapping_div(b))
    }
}

fn int_arith(
    registry: &Registry,
    int: &Type,
    name: &str,
    f: impl Fn(i32, i32, Span) -> Result<i32, Diagnostic> + 'static,
) {
    let out = int.clone();
    registry.method(int, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::Int(a), Value::Int(b)) => Ok(Object::new(Value::Int(f(a, b, span)?), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

fn int_compare(
    registry: &Registry,
    int: &Type,
    boolean: &Type,
    name: &str,
    f: impl Fn(i32, i32) -> bool + 'static,
) {
    let out = boolean.clone();
    registry.method(int, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::Int(a), Value::Int(b)) => Ok(Object::new(Value::Bool(f(a, b)), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

fn int_assign(
    registry: &Registry,
    int: &Type,
    name: &str,
    f: impl Fn(i32, i32, Span) -> Result<i32, Diagnostic> + 'static,
) {
    let out = int.clone();
    registry.method(int, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::Int(a), Value::Int(b)) => {
                this.set(Value::Int(f(a, b, span)?), out.clone());
                Ok(this)
            }
            _ => Err(invalid_operands(span)),
        }
    });
}

fn int_unary(registry: &Registry, int: &Type, name: &str, f: impl Fn(i32) -> i32 + 'static) {
    let out = int.clone();
    registry.method(int, name, move |env, span| {
        let this = operand(env, span, "this")?;
        match this.value() {
            Value::Int(a) => Ok(Object::new(Value::Int(f(a)), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

// =========================================
// float
// =========================================

fn register_float(registry: &Registry, float: &Type, boolean: &Type) {
    float_arith(registry, float, "add", |a, b| a + b);
    float_arith(registry, float, "subtract", |a, b| a - b);
    float_arith(registry, float, "multiply", |a, b| a * b);
    float_arith(registry, float, "divide", |a, b| a / b);
    float_arith(registry, float, "int_divide", |a, b| (a / b).trunc());
    float_arith(registry, float, "modulo", |a, b| a % b);
    float_arith(registry, float, "pow", f64::powf);

    float_compare(registry, float, boolean, "equal", |a, b| a == b);
    float_compare(registry, float, boolean, "not_equal", |a, b| a != b);
    float_compare(registry, float, boolean, "greater", |a, b| a > b);
    float_compare(registry, float, boolean, "less", |a, b| a < b);
    float_compare(registry, float, boolean, "greater_equal", |a, b| a >= b);
    float_compare(registry, float, boolean, "less_equal", |a, b| a <= b);

    float_assign(registry, float, "add_assign", |a, b| a + b);
    float_assign(registry, float, "subtract_assign", |a, b| a - b);
    float_assign(registry, float, "multiply_assign", |a, b| a * b);
    float_assign(registry, float, "divide_assign", |a, b| a / b);
    registry.assign(float);

    float_unary(registry, float, "negative", |a| -a);
    float_unary(registry, float, "positive", |a| a);
}

fn float_arith(
    registry: &Registry,
    float: &Type,
    name: &str,
    f: impl Fn(f64, f64) -> f64 + 'static,
) {
    let out = float.clone();
    registry.method(float, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::Float(a), Value::Float(b)) => Ok(Object::new(Value::Float(f(a, b)), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

fn float_compare(
    registry: &Registry,
    float: &Type,
    boolean: &Type,
    name: &str,
    f: impl Fn(f64, f64) -> bool + 'static,
) {
    let out = boolean.clone();
    registry.method(float, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::Float(a), Value::Float(b)) => Ok(Object::new(Value::Bool(f(a, b)), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

fn float_assign(
    registry: &Registry,
    float: &Type,
    name: &str,
    f: impl Fn(f64, f64) -> f64 + 'static,
) {
    let out = float.clone();
    registry.method(float, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::Float(a), Value::Float(b)) => {
                this.set(Value::Float(f(a, b)), out.clone());
                Ok(this)
            }
            _ => Err(invalid_operands(span)),
        }
    });
}

fn float_unary(registry: &Registry, float: &Type, name: &str, f: impl Fn(f64) -> f64 + 'static) {
    let out = float.clone();
    registry.method(float, name, move |env, span| {
        let this = operand(env, span, "this")?;
        match this.value() {
            Value::Float(a) => Ok(Object::new(Value::Float(f(a)), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

// =========================================
// bool
// =========================================

fn register_bool(registry: &Registry, boolean: &Type) {
    bool_binary(registry, boolean, "equal", |a, b| a == b);
    bool_binary(registry, boolean, "not_equal", |a, b| a != b);
    bool_binary(registry, boolean, "and", |a, b| a && b);
    bool_binary(registry, boolean, "or", |a, b| a || b);
    registry.assign(boolean);

    let out = boolean.clone();
    registry.method(boolean, "not", move |env, span| {
        let this = operand(env, span, "this")?;
        match this.value() {
            Value::Bool(a) => Ok(Object::new(Value::Bool(!a), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

fn bool_binary(
    registry: &Registry,
    boolean: &Type,
    name: &str,
    f: impl Fn(bool, bool) -> bool + 'static,
) {
    let out = boolean.clone();
    registry.method(boolean, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Object::new(Value::Bool(f(a, b)), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

// =========================================
// string
// =========================================

fn register_string(registry: &Registry, string: &Type, boolean: &Type) {
    {
        let out = string.clone();
        registry.method(string, "add", move |env, span| {
            let (this, other) = operands(env, span)?;
            match (this.value(), other.value()) {
                (Value::Str(a), Value::Str(b)) => {
                    Ok(Object::new(Value::Str(format!("{a}{b}")), out.clone()))
                }
                _ => Err(invalid_operands(span)),
            }
        });
    }
    {
        let out = string.clone();
        registry.method(string, "add_assign", move |env, span| {
            let (this, other) = operands(env, span)?;
            match (this.value(), other.value()) {
                (Value::Str(a), Value::Str(b)) => {
                    this.set(Value::Str(format!("{a}{b}")), out.clone());
                    Ok(this)
                }
                _ => Err(invalid_operands(span)),
            }
        });
    }

    string_compare(registry, string, boolean, "equal", |a, b| a == b);
    string_compare(registry, string, boolean, "not_equal", |a, b| a != b);
    string_compare(registry, string, boolean, "greater", |a, b| a > b);
    string_compare(registry, string, boolean, "less", |a, b| a < b);
    string_compare(registry, string, boolean, "greater_equal", |a, b| a >= b);
    string_compare(registry, string, boolean, "less_equal", |a, b| a <= b);
    registry.assign(string);
}

fn string_compare(
    registry: &Registry,
    string: &Type,
    boolean: &Type,
    name: &str,
    f: impl Fn(&str, &str) -> bool + 'static,
) {
    let out = boolean.clone();
    registry.method(string, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::Str(a), Value::Str(b)) => Ok(Object::new(Value::Bool(f(&a, &b)), out.clone())),
            _ => Err(invalid_operands(span)),
        }
    });
}

// =========================================
// Type
// =========================================

fn register_type(registry: &Registry, type_ty: &Type, boolean: &Type) {
    type_compare(registry, type_ty, boolean, "equal", |a, b| a == b);
    type_compare(registry, type_ty, boolean, "not_equal", |a, b| a != b);
    registry.assign(type_ty);
}

fn type_compare(
    registry: &Registry,
    type_ty: &Type,
    boolean: &Type,
    name: &str,
    f: impl Fn(&Type, &Type) -> bool + 'static,
) {
    let out = boolean.clone();
    registry.method(type_ty, name, move |env, span| {
        let (this, other) = operands(env, span)?;
        match (this.value(), other.value()) {
            (Value::TypeValue(a), Value::TypeValue(b)) => {
                Ok(Object::new(Value::Bool(f(&a, &b)), out.clone()))
            }
            _ => Err(invalid_operands(span)),
        }
    });
}
