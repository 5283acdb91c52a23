//! Tree-walking evaluator.
//!
//! Statements evaluate strictly in source order against one environment
//! chain. Non-local control flow (return/break/continue) travels as an
//! explicit [`ReturnReason`] alongside the running result rather than as
//! a host-level unwind. Operators dispatch through the left operand's
//! type member table after a strict type-equality check; there is no
//! implicit coercion between built-in types.

use super::env::{Environment, EnvRef, Variable, declared_locally, insert, lookup};
use super::object::{Function, FunctionBody, Object, Parameter, Value};
use super::types::Type;
use crate::ast::{Expansion, LiteralValue, Node, NodeKind};
use crate::error::Diagnostic;
use crate::lexer::Span;
use std::rc::Rc;

/// Why a statement run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnReason {
    Return,
    Break,
    Continue,
    EndOfAst,
}

/// One entry on the explicit call stack. Diagnostic and return-type
/// bookkeeping only; evaluation state lives in the environment chain.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub node_kind: &'static str,
    pub return_type: Option<Type>,
}

/// Evaluate a checked statement list against `env`, which must be a
/// [`builtins::bootstrap`] environment or a descendant of one.
///
/// Returns the value of the last evaluated node and the reason the run
/// ended. The environment keeps any mutations the program made.
pub fn interpret(nodes: &[Node], env: &EnvRef) -> Result<(Object, ReturnReason), Diagnostic> {
    let mut interpreter = Interpreter {
        call_stack: Vec::new(),
    };
    interpreter.run(nodes, env)
}

/// Canonical method name for a binary operator.
fn binary_method(operator: &str) -> Option<&'static str> {
    Some(match operator {
        "+" => "add",
        "-" => "subtract",
        "*" => "multiply",
        "/" => "divide",
        "$" => "int_divide",
        "%" => "modulo",
        "^" => "pow",
        "==" => "equal",
        "!=" => "not_equal",
        ">" => "greater",
        "<" => "less",
        ">=" => "greater_equal",
        "<=" => "less_equal",
        "&" => "and",
        "|" => "or",
        "=" => "assign",
        "+=" => "add_assign",
        "-=" => "subtract_assign",
        "*=" => "multiply_assign",
        "/=" => "divide_assign",
        _ => return None,
    })
}

/// Canonical method name for a unary prefix operator.
fn unary_method(operator: &str) -> Option<&'static str> {
    Some(match operator {
        "!" => "not",
        "-" => "negative",
        "+" => "positive",
        _ => return None,
    })
}

fn method_function(ty: &Type, method: &str, span: Span, message: String) -> Result<Function, Diagnostic> {
    match ty.member(method).map(|m| m.object.value()) {
        Some(Value::Function(function)) => Ok(function),
        _ => Err(Diagnostic::operation(span, message)),
    }
}

fn describe_parameters(parameters: &[Parameter]) -> String {
    let described: Vec<String> = parameters
        .iter()
        .map(|p| match &p.ty {
            Some(ty) => format!("{} {}", ty.name(), p.name),
            None => p.name.clone(),
        })
        .collect();
    described.join(", ")
}

struct Interpreter {
    call_stack: Vec<CallFrame>,
}

impl Interpreter {
    /// Evaluate nodes in order; the last value is the running result.
    fn run(&mut self, nodes: &[Node], env: &EnvRef) -> Result<(Object, ReturnReason), Diagnostic> {
        let mut result = self.void_object(env, Span::point(0))?;
        for node in nodes {
            let (object, reason) = self.eval(node, env)?;
            result = object;
            if reason != ReturnReason::EndOfAst {
                return Ok((result, reason));
            }
        }
        Ok((result, ReturnReason::EndOfAst))
    }

    fn eval(&mut self, node: &Node, env: &EnvRef) -> Result<(Object, ReturnReason), Diagnostic> {
        let span = node.span;
        match &node.kind {
            NodeKind::Literal(literal) => Ok((
                self.literal_object(literal, env, span)?,
                ReturnReason::EndOfAst,
            )),
            NodeKind::GetVariable { name } | NodeKind::TypeExpression { name, .. } => {
                let variable = lookup(env, name).ok_or_else(|| {
                    Diagnostic::identifier(span, format!("Undefined variable '{name}'"))
                })?;
                Ok((variable.object, ReturnReason::EndOfAst))
            }
            NodeKind::CodeBlock {
                parameters,
                return_type,
                body,
            } => Ok((
                self.eval_code_block(span, parameters, return_type.as_deref(), body, env)?,
                ReturnReason::EndOfAst,
            )),
            NodeKind::Operation {
                operator,
                left,
                right,
            } => {
                let object = match left {
                    Some(left) => {
                        let left = self.eval_expr(left, env)?;
                        let right = self.eval_expr(right, env)?;
                        self.dispatch_binary(operator, left, right, span, env)?
                    }
                    None => {
                        let operand = self.eval_expr(right, env)?;
                        self.dispatch_unary(operator, operand, span, env)?
                    }
                };
                Ok((object, ReturnReason::EndOfAst))
            }
            NodeKind::DeclareVariable {
                name,
                ty,
                qualifiers,
                value,
            } => {
                let object = self.eval_declare(span, name, ty.as_deref(), *qualifiers, value.as_deref(), env)?;
                Ok((object, ReturnReason::EndOfAst))
            }
            NodeKind::FunctionCall { name, arguments } => Ok((
                self.eval_call(name, arguments, span, env)?,
                ReturnReason::EndOfAst,
            )),
            NodeKind::MemberAccess {
                object,
                member,
                arguments,
            } => Ok((
                self.eval_member(span, object, member, arguments.as_deref(), env)?,
                ReturnReason::EndOfAst,
            )),
            NodeKind::ClassDefinition { .. } => Err(Diagnostic::syntax(
                span,
                "class definitions are not yet supported",
            )),
            NodeKind::IfStatement {
                branches,
                else_body,
            } => {
                for branch in branches {
                    if self.eval_condition(&branch.condition, env)? {
                        return self.run(&branch.body, env);
                    }
                }
                match else_body {
                    Some(body) => self.run(body, env),
                    None => Ok((self.void_object(env, span)?, ReturnReason::EndOfAst)),
                }
            }
            NodeKind::SwitchStatement {
                scrutinee,
                cases,
                default,
            } => {
                let value = self.eval_expr(scrutinee, env)?;
                for case in cases {
                    let literal = self.eval_expr(&case.literal, env)?;
                    let equal = self.dispatch_binary(
                        "==",
                        value.clone(),
                        literal,
                        case.literal.span,
                        env,
                    )?;
                    if matches!(equal.value(), Value::Bool(true)) {
                        // No fallthrough: exactly one arm runs.
                        return self.run(&case.body, env);
                    }
                }
                match default {
                    Some(body) => self.run(body, env),
                    None => Ok((self.void_object(env, span)?, ReturnReason::EndOfAst)),
                }
            }
            NodeKind::WhileLoop { condition, body } => {
                let mut result = self.void_object(env, span)?;
                loop {
                    if !self.eval_condition(condition, env)? {
                        break;
                    }
                    let (object, reason) = self.run(body, env)?;
                    result = object;
                    match reason {
                        ReturnReason::Break => break,
                        ReturnReason::Return => return Ok((result, ReturnReason::Return)),
                        ReturnReason::Continue | ReturnReason::EndOfAst => {}
                    }
                }
                Ok((result, ReturnReason::EndOfAst))
            }
            NodeKind::ForLoop {
                init,
                condition,
                step,
                body,
            } => {
                self.eval(init, env)?;
                let mut result = self.void_object(env, span)?;
                loop {
                    if !self.eval_condition(condition, env)? {
                        break;
                    }
                    let (object, reason) = self.run(body, env)?;
                    result = object;
                    match reason {
                        ReturnReason::Break => break,
                        ReturnReason::Return => return Ok((result, ReturnReason::Return)),
                        ReturnReason::Continue | ReturnReason::EndOfAst => {}
                    }
                    self.eval(step, env)?;
                }
                Ok((result, ReturnReason::EndOfAst))
            }
            NodeKind::ForEachLoop {
                ty,
                name,
                iterable,
                body,
            } => {
                let declared = self.resolve_type(ty, env)?;
                let source = self.eval_expr(iterable, env)?;
                let Value::Str(text) = source.value() else {
                    return Err(Diagnostic::type_error(
                        iterable.span,
                        format!("type {} is not iterable", source.ty().name()),
                    ));
                };
                let string_ty = self.builtin_type(env, "string", ty.span)?;
                if declared != string_ty {
                    return Err(Diagnostic::type_error(
                        ty.span,
                        format!("Type mismatch: expected string, found {}", declared.name()),
                    ));
                }

                let mut result = self.void_object(env, span)?;
                for c in text.chars() {
                    insert(
                        env,
                        name.clone(),
                        Variable::plain(Object::new(Value::Str(c.to_string()), string_ty.clone())),
                    );
                    let (object, reason) = self.run(body, env)?;
                    result = object;
                    match reason {
                        ReturnReason::Break => break,
                        ReturnReason::Return => return Ok((result, ReturnReason::Return)),
                        ReturnReason::Continue | ReturnReason::EndOfAst => {}
                    }
                }
                Ok((result, ReturnReason::EndOfAst))
            }
            NodeKind::Return { value } => {
                let object = match value {
                    Some(value) => self.eval_expr(value, env)?,
                    None => self.void_object(env, span)?,
                };
                Ok((object, ReturnReason::Return))
            }
            NodeKind::Break => Ok((self.void_object(env, span)?, ReturnReason::Break)),
            NodeKind::Continue => Ok((self.void_object(env, span)?, ReturnReason::Continue)),
            NodeKind::ParameterExpression { .. }
            | NodeKind::QualifierExpression { .. }
            | NodeKind::StatementEnd => Err(Diagnostic::syntax(span, "Invalid expression")),
        }
    }

    /// Evaluate in expression position; the checker already ruled out
    /// control-flow reasons here.
    fn eval_expr(&mut self, node: &Node, env: &EnvRef) -> Result<Object, Diagnostic> {
        let (object, _) = self.eval(node, env)?;
        Ok(object)
    }

    fn eval_condition(&mut self, condition: &Node, env: &EnvRef) -> Result<bool, Diagnostic> {
        let object = self.eval_expr(condition, env)?;
        match object.value() {
            Value::Bool(b) => Ok(b),
            _ => Err(Diagnostic::type_error(
                condition.span,
                format!("Condition must be bool, found {}", object.ty().name()),
            )),
        }
    }

    // =========================================
    // Values and types
    // =========================================

    fn builtin_type(&self, env: &EnvRef, name: &str, span: Span) -> Result<Type, Diagnostic> {
        match lookup(env, name).map(|v| v.object.value()) {
            Some(Value::TypeValue(ty)) => Ok(ty),
            _ => Err(Diagnostic::type_error(span, format!("Undefined type {name}"))),
        }
    }

    fn void_object(&self, env: &EnvRef, span: Span) -> Result<Object, Diagnostic> {
        Ok(Object::new(Value::Void, self.builtin_type(env, "void", span)?))
    }

    fn literal_object(
        &self,
        literal: &LiteralValue,
        env: &EnvRef,
        span: Span,
    ) -> Result<Object, Diagnostic> {
        let (value, ty) = match literal {
            LiteralValue::Int(v) => (Value::Int(*v), self.builtin_type(env, "int", span)?),
            LiteralValue::Float(v) => (Value::Float(*v), self.builtin_type(env, "float", span)?),
            LiteralValue::Bool(v) => (Value::Bool(*v), self.builtin_type(env, "bool", span)?),
            LiteralValue::Str(v) => (Value::Str(v.clone()), self.builtin_type(env, "string", span)?),
        };
        Ok(Object::new(value, ty))
    }

    /// Resolve a type reference node to a runtime type. Generic arguments
    /// carry no runtime meaning yet and only the base name resolves.
    fn resolve_type(&self, node: &Node, env: &EnvRef) -> Result<Type, Diagnostic> {
        let name = match &node.kind {
            NodeKind::TypeExpression { name, .. } | NodeKind::GetVariable { name } => name,
            _ => return Err(Diagnostic::type_error(node.span, "Undefined type")),
        };
        match lookup(env, name).map(|v| v.object.value()) {
            Some(Value::TypeValue(ty)) => Ok(ty),
            _ => Err(Diagnostic::type_error(
                node.span,
                format!("Undefined type {name}"),
            )),
        }
    }

    // =========================================
    // Operator dispatch
    // =========================================

    /// Dispatch a binary operator through the left operand's type.
    fn dispatch_binary(
        &mut self,
        operator: &str,
        left: Object,
        right: Object,
        span: Span,
        env: &EnvRef,
    ) -> Result<Object, Diagnostic> {
        let left_ty = left.ty();
        let right_ty = right.ty();
        if left_ty != right_ty {
            return Err(Diagnostic::type_error(
                span,
                format!(
                    "Type mismatch for '{}': {} and {}",
                    operator,
                    left_ty.name(),
                    right_ty.name()
                ),
            ));
        }
        let Some(method) = binary_method(operator) else {
            return Err(Diagnostic::syntax(span, "Invalid operator"));
        };
        let message = format!(
            "No operation '{}' for types {} and {}",
            operator,
            left_ty.name(),
            right_ty.name()
        );
        let function = method_function(&left_ty, method, span, message)?;

        let child = Environment::child_of(env);
        insert(&child, "this".to_string(), Variable::plain(left));
        insert(&child, "other".to_string(), Variable::plain(right));
        self.invoke(&function, &child, span, "Operation")
    }

    fn dispatch_unary(
        &mut self,
        operator: &str,
        operand: Object,
        span: Span,
        env: &EnvRef,
    ) -> Result<Object, Diagnostic> {
        let ty = operand.ty();
        let Some(method) = unary_method(operator) else {
            return Err(Diagnostic::syntax(span, "Invalid operator"));
        };
        let message = format!("No operation '{}' for type {}", operator, ty.name());
        let function = method_function(&ty, method, span, message)?;

        let child = Environment::child_of(env);
        insert(&child, "this".to_string(), Variable::plain(operand));
        self.invoke(&function, &child, span, "Operation")
    }

    // =========================================
    // Declarations and calls
    // =========================================

    fn eval_declare(
        &mut self,
        span: Span,
        name: &str,
        ty: Option<&Node>,
        qualifiers: crate::ast::Qualifiers,
        value: Option<&Node>,
        env: &EnvRef,
    ) -> Result<Object, Diagnostic> {
        // Rejected before the type resolves or the initializer runs.
        if declared_locally(env, name) {
            return Err(Diagnostic::identifier(
                span,
                format!("Redefined variable '{name}'"),
            ));
        }

        let declared_ty = match ty {
            Some(ty) => Some(self.resolve_type(ty, env)?),
            None => None,
        };

        let object = match value {
            Some(value) => {
                let object = self.eval_expr(value, env)?;
                if let Some(declared) = &declared_ty
                    && *declared != object.ty()
                {
                    return Err(Diagnostic::type_error(
                        span,
                        format!(
                            "Type mismatch: expected {}, found {}",
                            declared.name(),
                            object.ty().name()
                        ),
                    ));
                }
                object
            }
            None => match &declared_ty {
                Some(declared) => self.default_value(declared, span)?,
                None => return Err(Diagnostic::type_error(span, "Missing initializer")),
            },
        };

        insert(
            env,
            name.to_string(),
            Variable {
                object: object.clone(),
                qualifiers,
            },
        );
        Ok(object)
    }

    /// Zero value for a declaration with no initializer.
    fn default_value(&self, ty: &Type, span: Span) -> Result<Object, Diagnostic> {
        let value = match ty.name().as_str() {
            "int" => Value::Int(0),
            "float" => Value::Float(0.0),
            "bool" => Value::Bool(false),
            "string" => Value::Str(String::new()),
            "void" => Value::Void,
            _ => {
                return Err(Diagnostic::type_error(
                    span,
                    format!("Missing initializer for type {}", ty.name()),
                ));
            }
        };
        Ok(Object::new(value, ty.clone()))
    }

    fn eval_code_block(
        &mut self,
        span: Span,
        parameters: &[Node],
        return_type: Option<&Node>,
        body: &[Node],
        env: &EnvRef,
    ) -> Result<Object, Diagnostic> {
        let return_type = match return_type {
            Some(ty) => Some(self.resolve_type(ty, env)?),
            None => None,
        };

        let mut resolved = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            let NodeKind::ParameterExpression {
                name,
                ty,
                default,
                expansion,
            } = &parameter.kind
            else {
                return Err(Diagnostic::syntax(parameter.span, "Invalid expression"));
            };
            let ty = match ty {
                Some(ty) => Some(self.resolve_type(ty, env)?),
                None => None,
            };
            resolved.push(Parameter {
                name: name.clone(),
                ty,
                default: default.as_deref().cloned(),
                expansion: *expansion,
            });
        }

        let function_ty = self.builtin_type(env, "Function", span)?;
        Ok(Object::new(
            Value::Function(Function {
                return_type,
                parameters: resolved,
                body: FunctionBody::Ast(Rc::new(body.to_vec())),
            }),
            function_ty,
        ))
    }

    fn eval_call(
        &mut self,
        name: &str,
        arguments: &[Node],
        span: Span,
        env: &EnvRef,
    ) -> Result<Object, Diagnostic> {
        let Some(variable) = lookup(env, name) else {
            return Err(Diagnostic::identifier(
                span,
                format!("Undefined function '{name}'"),
            ));
        };
        let Value::Function(function) = variable.object.value() else {
            return Err(Diagnostic::type_error(
                span,
                format!("'{name}' is not a function"),
            ));
        };

        // The invocation scope is a child of the call site's environment,
        // not of the function's defining environment.
        let child = Environment::child_of(env);
        self.bind_arguments(&function, arguments, span, env, &child)?;
        self.invoke(&function, &child, span, "FunctionCall")
    }

    fn bind_arguments(
        &mut self,
        function: &Function,
        arguments: &[Node],
        span: Span,
        env: &EnvRef,
        child: &EnvRef,
    ) -> Result<(), Diagnostic> {
        if arguments.len() > function.parameters.len() {
            return Err(Diagnostic::function(
                span,
                format!(
                    "Too many arguments; expected parameters: {}",
                    describe_parameters(&function.parameters)
                ),
            ));
        }

        for (index, parameter) in function.parameters.iter().enumerate() {
            if parameter.expansion != Expansion::None {
                return Err(Diagnostic::function(
                    span,
                    "expansion parameters are not yet supported",
                ));
            }

            let object = match arguments.get(index) {
                Some(argument) => {
                    let object = self.eval_expr(argument, env)?;
                    self.check_parameter_type(parameter, &object, argument.span)?;
                    object
                }
                None => match &parameter.default {
                    Some(default) => {
                        let object = self.eval_expr(default, env)?;
                        self.check_parameter_type(parameter, &object, default.span)?;
                        object
                    }
                    None => {
                        return Err(Diagnostic::function(
                            span,
                            format!(
                                "Missing argument '{}'; expected parameters: {}",
                                parameter.name,
                                describe_parameters(&function.parameters)
                            ),
                        ));
                    }
                },
            };
            insert(child, parameter.name.clone(), Variable::plain(object));
        }
        Ok(())
    }

    fn check_parameter_type(
        &self,
        parameter: &Parameter,
        object: &Object,
        span: Span,
    ) -> Result<(), Diagnostic> {
        if let Some(ty) = &parameter.ty
            && *ty != object.ty()
        {
            return Err(Diagnostic::type_error(
                span,
                format!(
                    "Type mismatch for parameter '{}': expected {}, found {}",
                    parameter.name,
                    ty.name(),
                    object.ty().name()
                ),
            ));
        }
        Ok(())
    }

    fn eval_member(
        &mut self,
        span: Span,
        object_node: &Node,
        member: &str,
        arguments: Option<&[Node]>,
        env: &EnvRef,
    ) -> Result<Object, Diagnostic> {
        let object = self.eval_expr(object_node, env)?;
        // Type values expose their definition's members directly.
        let ty = match object.value() {
            Value::TypeValue(ty) => ty,
            _ => object.ty(),
        };
        let Some(found) = ty.member(member) else {
            return Err(Diagnostic::identifier(
                span,
                format!("Undefined member '{}' for type {}", member, ty.name()),
            ));
        };

        let Some(arguments) = arguments else {
            return Ok(found.object);
        };
        let Value::Function(function) = found.object.value() else {
            return Err(Diagnostic::type_error(
                span,
                format!("'{member}' is not a function"),
            ));
        };

        let child = Environment::child_of(env);
        insert(&child, "this".to_string(), Variable::plain(object));
        // Native operator methods take their single operand as `other`.
        if function.parameters.is_empty()
            && arguments.len() == 1
            && matches!(function.body, FunctionBody::Native(_))
        {
            let other = self.eval_expr(&arguments[0], env)?;
            insert(&child, "other".to_string(), Variable::plain(other));
        } else {
            self.bind_arguments(&function, arguments, span, env, &child)?;
        }
        self.invoke(&function, &child, span, "MemberAccess")
    }

    /// Run a function body with a frame on the explicit call stack.
    fn invoke(
        &mut self,
        function: &Function,
        env: &EnvRef,
        span: Span,
        node_kind: &'static str,
    ) -> Result<Object, Diagnostic> {
        self.call_stack.push(CallFrame {
            node_kind,
            return_type: function.return_type.clone(),
        });
        let result = match &function.body {
            FunctionBody::Native(native) => native(env, span),
            FunctionBody::Ast(body) => self.run(body, env).map(|(object, _)| object),
        };
        self.call_stack.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::interpreter::builtins;

    fn run_source(source: &str) -> Result<(Object, EnvRef), Diagnostic> {
        let env = builtins::bootstrap();
        let tokens = crate::lexer::tokenize(source)?;
        let nodes = crate::semantic::check(crate::parser::parse(tokens)?)?;
        let (object, _) = interpret(&nodes, &env)?;
        Ok((object, env))
    }

    fn int_result(source: &str) -> i32 {
        match run_source(source).unwrap().0.value() {
            Value::Int(v) => v,
            other => panic!("expected int from {source:?}, got {other:?}"),
        }
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(int_result("3 + 4;"), 7);
        assert_eq!(int_result("2 + 3 * 4;"), 14);
        assert_eq!(int_result("10 $ 3;"), 3);
        assert_eq!(int_result("10 % 3;"), 1);
        assert_eq!(int_result("2 ^ 3;"), 8);
    }

    #[test]
    fn result_carries_the_builtin_type() {
        let (object, env) = run_source("3 + 4;").unwrap();
        let Some(Value::TypeValue(int)) = lookup(&env, "int").map(|v| v.object.value()) else {
            panic!("missing int type");
        };
        assert_eq!(object.ty(), int);
    }

    #[test]
    fn mixed_types_are_rejected() {
        let err = run_source("3 + 4.0;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.contains("int"));
        assert!(err.message.contains("float"));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(int_result("-3;"), -3);
        assert!(matches!(
            run_source("!true;").unwrap().0.value(),
            Value::Bool(false)
        ));
        // Pow binds inside the unary operand.
        assert_eq!(int_result("-2 ^ 2;"), -4);
    }

    #[test]
    fn declarations_and_defaults() {
        assert_eq!(int_result("int x = 5; x;"), 5);
        assert_eq!(int_result("int x; x;"), 0);
    }

    #[test]
    fn redeclaration_in_same_scope() {
        let err = run_source("int x = 1; int x = 2;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Identifier);
        assert!(err.message.contains('x'));
    }

    #[test]
    fn shadowing_in_a_call_scope() {
        // The parameter shadows the outer x without error.
        assert_eq!(int_result("int x = 1; int f(int x) { return x; } f(9);"), 9);
    }

    #[test]
    fn declaration_type_mismatch() {
        let err = run_source("int x = 1.5;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn assignment_and_compound_assignment() {
        assert_eq!(int_result("int x = 1; x = 5; x;"), 5);
        assert_eq!(int_result("int x = 1; x += 4; x;"), 5);
    }

    #[test]
    fn initializer_binds_the_same_object() {
        // Declaration from a variable aliases the object, so compound
        // assignment through one name shows through the other.
        assert_eq!(int_result("int x = 1; int y = x; y += 1; x;"), 2);
    }

    #[test]
    fn function_definition_and_call() {
        assert_eq!(
            int_result("int add(int a, int b) { return a + b; } add(1, 2);"),
            3
        );
    }

    #[test]
    fn default_parameter_value() {
        assert_eq!(int_result("int f(int a = 4) { return a; } f();"), 4);
        assert_eq!(int_result("int f(int a = 4) { return a; } f(6);"), 6);
    }

    #[test]
    fn missing_argument_enumerates_parameters() {
        let err = run_source("int f(int a, int b) { return a; } f(1);").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Function);
        assert!(err.message.contains("int a, int b"));
    }

    #[test]
    fn too_many_arguments() {
        let err = run_source("int f(int a) { return a; } f(1, 2);").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Function);
    }

    #[test]
    fn argument_type_mismatch() {
        let err = run_source("int f(int a) { return a; } f(1.5);").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn expansion_parameters_are_unsupported() {
        let err = run_source("int f(*rest) { return 0; } f(1);").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Function);
        assert_eq!(err.message, "expansion parameters are not yet supported");
    }

    #[test]
    fn calls_see_the_call_site_scope() {
        // The invocation environment chains from the call site, so the
        // body finds names declared after the function definition.
        assert_eq!(int_result("int f() { return hidden; } int hidden = 7; f();"), 7);
    }

    #[test]
    fn class_definitions_do_not_evaluate() {
        let err = run_source("class C { int x; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "class definitions are not yet supported");
    }

    #[test]
    fn if_else_selection() {
        assert_eq!(int_result("if (1 < 2) { 10; } else { 20; }"), 10);
        assert_eq!(int_result("if (1 > 2) { 10; } else { 20; }"), 20);
        assert_eq!(
            int_result("int x = 2; if (x == 1) { 10; } else if (x == 2) { 20; } else { 30; }"),
            20
        );
    }

    #[test]
    fn non_bool_condition() {
        let err = run_source("if (1) { 2; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn while_loop_with_break_and_continue() {
        assert_eq!(
            int_result("int i = 0; while (true) { i += 1; if (i == 3) { break; } } i;"),
            3
        );
        assert_eq!(
            int_result(
                "int i = 0; int n = 0; \
                 while (i < 5) { i += 1; if (i == 2) { continue; } n += 1; } n;"
            ),
            4
        );
    }

    #[test]
    fn for_loop_accumulates() {
        assert_eq!(
            int_result("int sum = 0; for (int i = 1; i <= 4; i += 1) { sum += i; } sum;"),
            10
        );
    }

    #[test]
    fn foreach_over_string() {
        let (object, _) =
            run_source("string out = ''; foreach (string c in 'abc') { out += c; } out;").unwrap();
        assert!(matches!(object.value(), Value::Str(s) if s == "abc"));
    }

    #[test]
    fn foreach_over_non_iterable() {
        let err = run_source("int x = 1; foreach (string c in x) { c; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.contains("not iterable"));
    }

    #[test]
    fn switch_selects_one_arm() {
        assert_eq!(
            int_result("int x = 2; switch (x) { case 1 { 10; } case 2 { 20; } default { 30; } }"),
            20
        );
        assert_eq!(
            int_result("int x = 9; switch (x) { case 1 { 10; } default { 30; } }"),
            30
        );
    }

    #[test]
    fn switch_case_type_mismatch() {
        let err = run_source("int x = 1; switch (x) { case 'a' { 10; } }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn member_access_dispatch() {
        assert_eq!(int_result("int x = 1; x.add(2);"), 3);

        let err = run_source("int x = 1; x.missing;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Identifier);
    }

    #[test]
    fn type_values_compare_by_identity() {
        assert!(matches!(
            run_source("int == int;").unwrap().0.value(),
            Value::Bool(true)
        ));
        assert!(matches!(
            run_source("int == float;").unwrap().0.value(),
            Value::Bool(false)
        ));
    }

    #[test]
    fn undefined_names() {
        let err = run_source("missing;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Identifier);

        let err = run_source("missing();").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Identifier);

        let err = run_source("nosuch x = 1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn division_by_zero_at_runtime() {
        let err = run_source("1 / 0;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Operation);
        assert_eq!(err.message, "Division by zero");
    }
}
