// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tree-walking evaluation of parsed templates.

use std::cmp::Ordering;

use super::ast::{BoolOp, Clause, CompareOp, Conversion, Expr, Field, Part, Template, UnaryOp};
use super::builtins::{self, Builtin};
use super::format::format_value;
use super::ops;
use super::parser::{RED_ZONE, STACK_PER_RECURSION};
use super::value::{compare_values, values_equal, Value};
use crate::domain::{EvalError, RuntimeErrorKind, Scope};

/// Renders a template against a scope.
pub fn render(template: &Template, scope: &Scope) -> Result<String, EvalError> {
    let mut env = Env {
        scope,
        locals: Vec::new(),
    };
    env.render(template)
}

/// Evaluation environment: the scope plus comprehension variables.
struct Env<'a> {
    scope: &'a Scope,
    locals: Vec<(String, Value)>,
}

impl<'a> Env<'a> {
    fn render(&mut self, template: &Template) -> Result<String, EvalError> {
        let mut out = String::new();
        for part in &template.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Field(field) => out.push_str(&self.render_field(field)?),
            }
        }
        Ok(out)
    }

    fn render_field(&mut self, field: &Field) -> Result<String, EvalError> {
        let value = self.eval(&field.expr)?;

        let conversion = match (field.conversion, &field.debug_text, &field.spec) {
            (Some(conversion), _, _) => Some(conversion),
            // `{x=}` shows the repr unless a spec asks for formatting.
            (None, Some(_), None) => Some(Conversion::Repr),
            _ => None,
        };
        let value = match conversion {
            Some(Conversion::Str) => Value::Str(value.to_str()),
            Some(Conversion::Repr) => Value::Str(value.repr()),
            Some(Conversion::Ascii) => Value::Str(value.ascii()),
            None => value,
        };

        let spec = match &field.spec {
            Some(spec) => self.render(spec)?,
            None => String::new(),
        };
        let formatted = format_value(&value, &spec)?;

        Ok(match &field.debug_text {
            Some(text) => format!("{}{}", text, formatted),
            None => formatted,
        })
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some((_, value)) = self.locals.iter().rev().find(|(local, _)| local == name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.scope.get(name) {
            return Ok(Value::Str(value.to_string()));
        }
        if let Some(builtin) = Builtin::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(EvalError::UndefinedName {
            name: name.to_string(),
        })
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.eval_expr(expr))
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Comprehension { element, clauses } => {
                let mut out = Vec::new();
                self.comprehend(element, clauses, &mut out)?;
                Ok(Value::List(out))
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    _ => ops::unary(*op, &operand),
                }
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, &left, &right)
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::BoolOp { op, left, right } => {
                let left = self.eval(left)?;
                match (op, left.is_truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Conditional { test, body, orelse } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(body)
                } else {
                    self.eval(orelse)
                }
            }
            Expr::Call { func, args, kwargs } => {
                let func = self.eval(func)?;
                let (args, kwargs) = self.eval_args(args, kwargs)?;
                match func {
                    Value::Builtin(builtin) => builtins::call(builtin, args, kwargs),
                    other => Err(EvalError::type_error(format!(
                        "'{}' object is not callable",
                        other.type_name()
                    ))),
                }
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
                kwargs,
            } => {
                let receiver = self.eval(receiver)?;
                let (args, kwargs) = self.eval_args(args, kwargs)?;
                builtins::call_method(&receiver, method, args, kwargs)
            }
            Expr::Attribute { value, name } => {
                let value = self.eval(value)?;
                attribute(&value, name)
            }
            Expr::Subscript { value, index } => {
                let value = self.eval(value)?;
                let index = self.eval(index)?;
                subscript(&value, &index)
            }
            Expr::Slice {
                value,
                lower,
                upper,
                step,
            } => {
                let value = self.eval(value)?;
                let lower = self.eval_bound(lower.as_deref())?;
                let upper = self.eval_bound(upper.as_deref())?;
                let step = self.eval_bound(step.as_deref())?;
                slice(&value, lower, upper, step)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn eval_args(
        &mut self,
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> Result<(Vec<Value>, Vec<(String, Value)>), EvalError> {
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let kwargs = kwargs
            .iter()
            .map(|(name, value)| Ok((name.clone(), self.eval(value)?)))
            .collect::<Result<Vec<_>, EvalError>>()?;
        Ok((args, kwargs))
    }

    fn eval_bound(&mut self, bound: Option<&Expr>) -> Result<Option<i64>, EvalError> {
        let Some(expr) = bound else {
            return Ok(None);
        };
        match self.eval(expr)? {
            Value::None => Ok(None),
            value => value.as_int().map(Some).ok_or_else(|| {
                EvalError::type_error(
                    "slice indices must be integers or None or have an __index__ method",
                )
            }),
        }
    }

    fn comprehend(
        &mut self,
        element: &Expr,
        clauses: &[Clause],
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        let Some((clause, rest)) = clauses.split_first() else {
            out.push(self.eval(element)?);
            return Ok(());
        };

        let items = self.eval(&clause.iter)?.iter_values()?;
        for item in items {
            self.locals.push((clause.target.clone(), item));
            let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
                self.comprehend_item(element, clause, rest, out)
            });
            self.locals.pop();
            result?;
        }
        Ok(())
    }

    fn comprehend_item(
        &mut self,
        element: &Expr,
        clause: &Clause,
        rest: &[Clause],
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for condition in &clause.conditions {
            if !self.eval(condition)?.is_truthy() {
                return Ok(());
            }
        }
        self.comprehend(element, rest, out)
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let ordered = |wanted: &[Ordering]| -> Result<bool, EvalError> {
        Ok(compare_values(left, right, op.symbol())?.is_some_and(|o| wanted.contains(&o)))
    };
    match op {
        CompareOp::Eq => Ok(values_equal(left, right)),
        CompareOp::NotEq => Ok(!values_equal(left, right)),
        CompareOp::Lt => ordered(&[Ordering::Less]),
        CompareOp::Le => ordered(&[Ordering::Less, Ordering::Equal]),
        CompareOp::Gt => ordered(&[Ordering::Greater]),
        CompareOp::Ge => ordered(&[Ordering::Greater, Ordering::Equal]),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
        CompareOp::Is => Ok(identical(left, right)),
        CompareOp::IsNot => Ok(!identical(left, right)),
    }
}

/// Identity is only observable for `None`, booleans and builtins.
fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        _ => false,
    }
}

fn contains(container: &Value, needle: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Str(haystack) => match needle {
            Value::Str(n) => Ok(haystack.contains(n.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.iter().any(|item| values_equal(item, needle))),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn attribute(value: &Value, name: &str) -> Result<Value, EvalError> {
    match (value, name) {
        (Value::Int(_) | Value::Float(_) | Value::Bool(_), "real") => match value {
            Value::Float(f) => Ok(Value::Float(*f)),
            other => Ok(Value::Int(other.as_int().unwrap_or(0))),
        },
        (Value::Int(_) | Value::Bool(_), "imag") => Ok(Value::Int(0)),
        (Value::Float(_), "imag") => Ok(Value::Float(0.0)),
        _ => Err(builtins::no_attribute(value, name)),
    }
}

/// Resolves a possibly negative index against a length.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

fn subscript(value: &Value, index: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Str(s) => {
            let i = index.as_int().ok_or_else(|| {
                EvalError::type_error(format!(
                    "string indices must be integers, not '{}'",
                    index.type_name()
                ))
            })?;
            let chars: Vec<char> = s.chars().collect();
            normalize_index(i, chars.len())
                .map(|i| Value::Str(chars[i].to_string()))
                .ok_or_else(|| {
                    EvalError::runtime(RuntimeErrorKind::IndexError, "string index out of range")
                })
        }
        Value::List(items) => {
            let i = index.as_int().ok_or_else(|| {
                EvalError::type_error(format!(
                    "list indices must be integers or slices, not {}",
                    index.type_name()
                ))
            })?;
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| {
                    EvalError::runtime(RuntimeErrorKind::IndexError, "list index out of range")
                })
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// The positions selected by a slice over a sequence of length `len`.
fn slice_positions(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, EvalError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::value_error("slice step cannot be zero"));
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);

    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound.saturating_add(len) } else { bound };
        bound.clamp(low, high)
    };
    let (start, stop) = if step > 0 {
        (
            lower.map_or(0, |b| clamp(b, 0, len)),
            upper.map_or(len, |b| clamp(b, 0, len)),
        )
    } else {
        (
            lower.map_or(len - 1, |b| clamp(b, -1, len - 1)),
            upper.map_or(-1, |b| clamp(b, -1, len - 1)),
        )
    };

    let mut positions = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(position) = usize::try_from(i) {
            positions.push(position);
        }
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(positions)
}

fn slice(
    value: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<Value, EvalError> {
    match value {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let positions = slice_positions(chars.len(), lower, upper, step)?;
            Ok(Value::Str(positions.into_iter().map(|i| chars[i]).collect()))
        }
        Value::List(items) => {
            let positions = slice_positions(items.len(), lower, upper, step)?;
            Ok(Value::List(
                positions.into_iter().map(|i| items[i].clone()).collect(),
            ))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse_template;
    use super::*;

    const PI: &str = "3.1415926535897932384626433832795";

    fn scope(pairs: &[(&str, &str)]) -> Scope {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn eval_with(src: &str, scope: &Scope) -> Result<String, EvalError> {
        render(&parse_template(src, false)?, scope)
    }

    fn eval(src: &str) -> String {
        eval_with(src, &Scope::new()).unwrap()
    }

    #[test]
    fn test_names_resolve_to_strings() {
        let scope = scope(&[("a", PI)]);
        assert_eq!(eval_with("two_{a}", &scope).unwrap(), format!("two_{}", PI));
    }

    #[test]
    fn test_undefined_name() {
        let err = eval_with("{b}", &Scope::new()).unwrap_err();
        assert_eq!(
            err,
            EvalError::UndefinedName {
                name: "b".to_string()
            }
        );
    }

    #[test]
    fn test_conditional_with_floats() {
        let scope = scope(&[("a", PI), ("b", "0")]);
        let src = r#"{a} is {"more" if float(a) > float(b) else "less"} than {b}"#;
        assert_eq!(
            eval_with(src, &scope).unwrap(),
            format!("{} is more than 0", PI)
        );
    }

    #[test]
    fn test_arithmetic_rendering() {
        let scope = scope(&[("a", PI)]);
        assert_eq!(eval_with("{(float(a)-1)}", &scope).unwrap(), "2.141592653589793");
        assert_eq!(eval_with("{float(a)/2}", &scope).unwrap(), "1.5707963267948966");
        assert_eq!(eval_with("{float(a):.2f}", &scope).unwrap(), "3.14");
        assert_eq!(eval_with("{a:.2s}", &scope).unwrap(), "3.");
    }

    #[test]
    fn test_string_divided_is_type_error() {
        let scope = scope(&[("a", PI)]);
        let err = eval_with("{a/2}", &scope).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Runtime {
                kind: RuntimeErrorKind::TypeError,
                ..
            }
        ));
    }

    #[test]
    fn test_generator_sum() {
        let scope = scope(&[("a", "4"), ("b", "5")]);
        assert_eq!(
            eval_with("{sum(float(_) for _ in [a,b])}", &scope).unwrap(),
            "9.0"
        );
    }

    #[test]
    fn test_scope_shadows_builtin() {
        let scope = scope(&[("a", PI), ("b", "5"), ("sum", "{sum(float(_) for _ in [a,b])}")]);
        let err = eval_with("{sum(float(_) for _ in [a,b])}", &scope).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: 'str' object is not callable");
    }

    #[test]
    fn test_comprehension_locals_shadow_scope() {
        let scope = scope(&[("x", "outer")]);
        assert_eq!(
            eval_with("{[x.upper() for x in ['a', 'b']]}{x}", &scope).unwrap(),
            "['A', 'B']outer"
        );
    }

    #[test]
    fn test_nested_comprehension_with_filter() {
        assert_eq!(
            eval("{[i * j for i in range(1, 3) for j in range(3) if j]}"),
            "[1, 2, 2, 4]"
        );
    }

    #[test]
    fn test_conversions_and_debug() {
        let scope = scope(&[("a", "x")]);
        assert_eq!(eval_with("{a!r}", &scope).unwrap(), "'x'");
        assert_eq!(eval_with("{a!s}", &scope).unwrap(), "x");
        assert_eq!(eval_with("{a=}", &scope).unwrap(), "a='x'");
        assert_eq!(eval_with("{a = !s}", &scope).unwrap(), "a = x");
        assert_eq!(eval_with("{a=:>3}", &scope).unwrap(), "a=  x");
        assert_eq!(eval("{'é'!a}"), "'\\xe9'");
    }

    #[test]
    fn test_nested_spec() {
        let scope = scope(&[("w", "6"), ("p", "2")]);
        assert_eq!(
            eval_with("{3.14159:>{w}.{p}f}", &scope).unwrap(),
            "  3.14"
        );
    }

    #[test]
    fn test_boolean_operators_return_operands() {
        assert_eq!(eval("{'' or 'fallback'}"), "fallback");
        assert_eq!(eval("{'x' and 'y'}"), "y");
        assert_eq!(eval("{not ''}"), "True");
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        assert_eq!(eval("{True or undefined}"), "True");
        assert_eq!(eval("{1 if True else 1/0}"), "1");
    }

    #[test]
    fn test_chained_comparison() {
        assert_eq!(eval("{1 < 2 < 3}"), "True");
        assert_eq!(eval("{1 < 3 < 2}"), "False");
        assert_eq!(eval("{'b' in 'abc'}"), "True");
        assert_eq!(eval("{3 not in [1, 2]}"), "True");
        assert_eq!(eval("{None is None}"), "True");
    }

    #[test]
    fn test_subscript_and_slice() {
        assert_eq!(eval("{'hello'[1]}"), "e");
        assert_eq!(eval("{'hello'[-1]}"), "o");
        assert_eq!(eval("{'hello'[1:3]}"), "el");
        assert_eq!(eval("{'hello'[::-1]}"), "olleh");
        assert_eq!(eval("{[1, 2, 3, 4][::2]}"), "[1, 3]");
        assert_eq!(eval("{'hello'[10:]}"), "");
        let err = eval_with("{'abc'[5]}", &Scope::new()).unwrap_err();
        assert_eq!(err.to_string(), "IndexError: string index out of range");
    }

    #[test]
    fn test_method_calls() {
        let scope = scope(&[("name", "world")]);
        assert_eq!(eval_with("{name.upper()}", &scope).unwrap(), "WORLD");
        assert_eq!(eval_with("{', '.join([name, name])}", &scope).unwrap(), "world, world");
    }

    #[test]
    fn test_attribute_error() {
        let err = eval_with("{'x'.nope}", &Scope::new()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Runtime {
                kind: RuntimeErrorKind::AttributeError,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_division() {
        let err = eval_with("{1/0}", &Scope::new()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Runtime {
                kind: RuntimeErrorKind::ZeroDivisionError,
                ..
            }
        ));
    }

    #[test]
    fn test_literal_escapes_and_braces() {
        assert_eq!(eval(r"a\tb{{c}}"), "a\tb{c}");
    }
}
