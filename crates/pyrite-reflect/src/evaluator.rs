//! Static evaluation of constant expressions.
//!
//! A [`ConstantEvaluator`] folds an initializer expression into a
//! [`ScalarValue`] without running any code. [`StaticEvaluator`] handles the
//! subset of expressions whose value is fully determined by the source text:
//! literals, arrays, operators over those, `true`/`false`/`null`, and
//! references to other constants of the same class. Anything else fails with
//! [`Error::UnsupportedExpression`].

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use pyrite_types::ScalarValue;
use pyrite_types::node::{BinaryOp, Expr, UnaryOp};

use crate::{Error, Result};

/// The constants an enclosing class makes visible to its initializers.
pub trait ClassConstants {
    /// The value of constant `name`, or `None` if the class does not
    /// declare it.
    fn resolve(&self, name: &str) -> Option<Result<ScalarValue>>;
}

impl ClassConstants for IndexMap<String, ScalarValue> {
    fn resolve(&self, name: &str) -> Option<Result<ScalarValue>> {
        self.get(name).cloned().map(Ok)
    }
}

/// What an expression is being evaluated for, and what it may refer to.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Human-readable name of the thing being evaluated, e.g. `Foo::BAR`
    subject: &'a str,
    /// Fully qualified name of the enclosing class
    class_name: Option<&'a str>,
    class_constants: Option<&'a dyn ClassConstants>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(subject: &'a str) -> Self {
        Self {
            subject,
            class_name: None,
            class_constants: None,
        }
    }

    /// Allow `self::NAME` (and `ClassName::NAME`) to resolve against `constants`.
    pub fn in_class(mut self, class_name: &'a str, constants: &'a dyn ClassConstants) -> Self {
        self.class_name = Some(class_name);
        self.class_constants = Some(constants);
        self
    }

    pub fn subject(&self) -> &str {
        self.subject
    }

    /// Look up a class constant visible from this context.
    ///
    /// `class` may be `self`, `static`, a fully qualified name with a leading
    /// `\`, or a name relative to the enclosing class's namespace.
    pub fn class_constant(&self, class: &str, name: &str) -> Option<Result<ScalarValue>> {
        let own = self.class_name?;
        if !is_own_class(class, own) {
            return None;
        }
        self.class_constants?.resolve(name)
    }
}

fn is_own_class(class: &str, own: &str) -> bool {
    if class.eq_ignore_ascii_case("self") || class.eq_ignore_ascii_case("static") {
        return true;
    }
    if let Some(qualified) = class.strip_prefix('\\') {
        return qualified == own;
    }
    // Unqualified and relative names resolve against the class's namespace
    match own.rsplit_once('\\') {
        Some((namespace, _)) => format!("{}\\{}", namespace, class) == own,
        None => class == own,
    }
}

impl fmt::Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("subject", &self.subject)
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

/// Folds constant expressions into scalar values.
pub trait ConstantEvaluator: Send + Sync {
    fn evaluate(&self, expr: &Expr, context: &EvaluationContext<'_>) -> Result<ScalarValue>;
}

/// The default evaluator; see the module documentation for what it supports.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticEvaluator;

impl ConstantEvaluator for StaticEvaluator {
    fn evaluate(&self, expr: &Expr, context: &EvaluationContext<'_>) -> Result<ScalarValue> {
        match expr {
            Expr::Int { value } => Ok(ScalarValue::Int(*value)),
            Expr::Float { value } => Ok(ScalarValue::Float(*value)),
            Expr::String { value } => Ok(ScalarValue::String(value.clone())),
            Expr::Array { items } => items
                .iter()
                .map(|item| self.evaluate(item, context))
                .collect::<Result<Vec<_>>>()
                .map(ScalarValue::Array),
            Expr::ConstFetch { name } => {
                let lowered = name.trim_start_matches('\\').to_ascii_lowercase();
                match lowered.as_str() {
                    "true" => Ok(ScalarValue::Bool(true)),
                    "false" => Ok(ScalarValue::Bool(false)),
                    "null" => Ok(ScalarValue::Null),
                    _ => Err(unsupported(context, expr, "constant is not statically known")),
                }
            }
            Expr::ClassConstFetch { class, name } => context
                .class_constant(class, name)
                .unwrap_or_else(|| {
                    Err(unsupported(context, expr, "constant is not declared in this class"))
                }),
            Expr::Unary { op, expr: operand } => {
                let value = self.evaluate(operand, context)?;
                unary(*op, value).map_err(|reason| unsupported(context, expr, reason))
            }
            Expr::Binary { op, lhs, rhs } => {
                let left = self.evaluate(lhs, context)?;

                // Logical operators short-circuit like they do at runtime
                match op {
                    BinaryOp::BooleanAnd if !left.is_truthy() => {
                        return Ok(ScalarValue::Bool(false));
                    }
                    BinaryOp::BooleanOr if left.is_truthy() => {
                        return Ok(ScalarValue::Bool(true));
                    }
                    _ => {}
                }

                let right = self.evaluate(rhs, context)?;
                binary(*op, left, right).map_err(|reason| unsupported(context, expr, reason))
            }
            Expr::Call { .. } => Err(unsupported(
                context,
                expr,
                "function calls cannot be evaluated statically",
            )),
        }
    }
}

fn unsupported(context: &EvaluationContext<'_>, expr: &Expr, reason: &str) -> Error {
    Error::UnsupportedExpression {
        subject: context.subject().to_string(),
        expression: expr.describe(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// Operators
// ============================================================================

type OpResult = std::result::Result<ScalarValue, &'static str>;

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Number::Int(i) => i,
            Number::Float(f) => f as i64,
        }
    }
}

impl From<Number> for ScalarValue {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(i) => ScalarValue::Int(i),
            Number::Float(f) => ScalarValue::Float(f),
        }
    }
}

fn parse_numeric(s: &str) -> Option<Number> {
    let s = s.trim();
    if s.is_empty()
        || !s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    s.parse::<i64>()
        .map(Number::Int)
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(Number::Float))
}

fn to_number(value: &ScalarValue) -> std::result::Result<Number, &'static str> {
    match value {
        ScalarValue::Int(i) => Ok(Number::Int(*i)),
        ScalarValue::Float(f) => Ok(Number::Float(*f)),
        ScalarValue::Bool(b) => Ok(Number::Int(i64::from(*b))),
        ScalarValue::Null => Ok(Number::Int(0)),
        ScalarValue::String(s) => parse_numeric(s).ok_or("operand is a non-numeric string"),
        ScalarValue::Array(_) => Err("arrays are not valid arithmetic operands"),
    }
}

fn to_int(value: &ScalarValue) -> std::result::Result<i64, &'static str> {
    to_number(value).map(Number::as_i64)
}

fn to_text(value: &ScalarValue) -> std::result::Result<String, &'static str> {
    match value {
        ScalarValue::Int(i) => Ok(i.to_string()),
        ScalarValue::Float(f) => Ok(format_float(*f)),
        ScalarValue::String(s) => Ok(s.clone()),
        ScalarValue::Bool(true) => Ok("1".to_string()),
        ScalarValue::Bool(false) | ScalarValue::Null => Ok(String::new()),
        ScalarValue::Array(_) => Err("arrays cannot be converted to string"),
    }
}

/// Float to string conversion with PHP's default precision of 14
/// significant digits.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return (if f > 0.0 { "INF" } else { "-INF" }).to_string();
    }
    if f == 0.0 {
        return (if f.is_sign_negative() { "-0" } else { "0" }).to_string();
    }

    let scientific = format!("{:.13e}", f);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    if !(-4..14).contains(&exponent) {
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        let sign = if exponent < 0 { '-' } else { '+' };
        if mantissa.contains('.') {
            format!("{}E{}{}", mantissa, sign, exponent.abs())
        } else {
            format!("{}.0E{}{}", mantissa, sign, exponent.abs())
        }
    } else {
        let decimals = usize::try_from(13 - exponent).unwrap_or(0);
        let fixed = format!("{:.*}", decimals, f);
        if fixed.contains('.') {
            fixed.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            fixed
        }
    }
}

fn unary(op: UnaryOp, value: ScalarValue) -> OpResult {
    match op {
        UnaryOp::Minus => Ok(match to_number(&value)? {
            Number::Int(i) => i
                .checked_neg()
                .map(ScalarValue::Int)
                .unwrap_or(ScalarValue::Float(-(i as f64))),
            Number::Float(f) => ScalarValue::Float(-f),
        }),
        UnaryOp::Plus => Ok(to_number(&value)?.into()),
        UnaryOp::Not => Ok(ScalarValue::Bool(!value.is_truthy())),
        UnaryOp::BitwiseNot => match value {
            ScalarValue::Int(i) => Ok(ScalarValue::Int(!i)),
            ScalarValue::Float(f) => Ok(ScalarValue::Int(!(f as i64))),
            _ => Err("bitwise not requires a number"),
        },
    }
}

fn binary(op: BinaryOp, lhs: ScalarValue, rhs: ScalarValue) -> OpResult {
    match op {
        BinaryOp::Plus => {
            if let (ScalarValue::Array(left), ScalarValue::Array(right)) = (&lhs, &rhs) {
                // Union: keys already present on the left win
                let mut union = left.clone();
                union.extend(right.iter().skip(left.len()).cloned());
                return Ok(ScalarValue::Array(union));
            }
            arithmetic(op, to_number(&lhs)?, to_number(&rhs)?)
        }
        BinaryOp::Minus | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow => {
            arithmetic(op, to_number(&lhs)?, to_number(&rhs)?)
        }
        BinaryOp::Concat => Ok(ScalarValue::String(to_text(&lhs)? + &to_text(&rhs)?)),
        BinaryOp::BitwiseAnd => Ok(ScalarValue::Int(to_int(&lhs)? & to_int(&rhs)?)),
        BinaryOp::BitwiseOr => Ok(ScalarValue::Int(to_int(&lhs)? | to_int(&rhs)?)),
        BinaryOp::BitwiseXor => Ok(ScalarValue::Int(to_int(&lhs)? ^ to_int(&rhs)?)),
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
            let (value, shift) = (to_int(&lhs)?, to_int(&rhs)?);
            if shift < 0 {
                return Err("bit shift by negative number");
            }
            let shifted = match (op, shift >= 64) {
                (BinaryOp::ShiftLeft, true) => 0,
                (BinaryOp::ShiftLeft, false) => value << shift,
                (_, true) => value >> 63,
                (_, false) => value >> shift,
            };
            Ok(ScalarValue::Int(shifted))
        }
        BinaryOp::BooleanAnd => Ok(ScalarValue::Bool(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::BooleanOr => Ok(ScalarValue::Bool(lhs.is_truthy() || rhs.is_truthy())),
        BinaryOp::Equal => Ok(ScalarValue::Bool(loose_equals(&lhs, &rhs))),
        BinaryOp::NotEqual => Ok(ScalarValue::Bool(!loose_equals(&lhs, &rhs))),
        BinaryOp::Identical => Ok(ScalarValue::Bool(lhs == rhs)),
        BinaryOp::NotIdentical => Ok(ScalarValue::Bool(lhs != rhs)),
        BinaryOp::Smaller => compare(&lhs, &rhs, |o| o == Ordering::Less),
        BinaryOp::SmallerOrEqual => compare(&lhs, &rhs, |o| o != Ordering::Greater),
        BinaryOp::Greater => compare(&lhs, &rhs, |o| o == Ordering::Greater),
        BinaryOp::GreaterOrEqual => compare(&lhs, &rhs, |o| o != Ordering::Less),
    }
}

fn arithmetic(op: BinaryOp, lhs: Number, rhs: Number) -> OpResult {
    match op {
        BinaryOp::Plus => Ok(int_or_float(lhs, rhs, i64::checked_add, |a, b| a + b)),
        BinaryOp::Minus => Ok(int_or_float(lhs, rhs, i64::checked_sub, |a, b| a - b)),
        BinaryOp::Mul => Ok(int_or_float(lhs, rhs, i64::checked_mul, |a, b| a * b)),
        BinaryOp::Div => {
            if rhs.as_f64() == 0.0 {
                return Err("division by zero");
            }
            if let (Number::Int(a), Number::Int(b)) = (lhs, rhs) {
                if let (Some(0), Some(quotient)) = (a.checked_rem(b), a.checked_div(b)) {
                    return Ok(ScalarValue::Int(quotient));
                }
            }
            Ok(ScalarValue::Float(lhs.as_f64() / rhs.as_f64()))
        }
        BinaryOp::Mod => {
            let (a, b) = (lhs.as_i64(), rhs.as_i64());
            if b == 0 {
                return Err("modulo by zero");
            }
            Ok(ScalarValue::Int(a.checked_rem(b).unwrap_or(0)))
        }
        BinaryOp::Pow => {
            if let (Number::Int(base), Number::Int(exp)) = (lhs, rhs) {
                if let Some(result) = u32::try_from(exp).ok().and_then(|e| base.checked_pow(e)) {
                    return Ok(ScalarValue::Int(result));
                }
            }
            Ok(ScalarValue::Float(lhs.as_f64().powf(rhs.as_f64())))
        }
        _ => Err("not an arithmetic operator"),
    }
}

fn int_or_float(
    lhs: Number,
    rhs: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> ScalarValue {
    if let (Number::Int(a), Number::Int(b)) = (lhs, rhs) {
        if let Some(result) = int_op(a, b) {
            return ScalarValue::Int(result);
        }
    }
    ScalarValue::Float(float_op(lhs.as_f64(), rhs.as_f64()))
}

fn numbers_equal(a: Number, b: Number) -> bool {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x == y,
        _ => a.as_f64() == b.as_f64(),
    }
}

fn loose_equals(lhs: &ScalarValue, rhs: &ScalarValue) -> bool {
    use ScalarValue::*;

    match (lhs, rhs) {
        (Bool(_), _) | (_, Bool(_)) => lhs.is_truthy() == rhs.is_truthy(),
        (Null, Null) => true,
        (Null, String(s)) | (String(s), Null) => s.is_empty(),
        (Null, other) | (other, Null) => !other.is_truthy(),
        (String(a), String(b)) => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => numbers_equal(x, y),
            _ => a == b,
        },
        (Array(a), Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_equals(x, y))
        }
        (Array(_), _) | (_, Array(_)) => false,
        _ => match (to_number(lhs), to_number(rhs)) {
            (Ok(x), Ok(y)) => numbers_equal(x, y),
            // A number against a non-numeric string compares as strings
            _ => to_text(lhs).ok() == to_text(rhs).ok(),
        },
    }
}

fn compare(lhs: &ScalarValue, rhs: &ScalarValue, accept: fn(Ordering) -> bool) -> OpResult {
    if let (ScalarValue::String(a), ScalarValue::String(b)) = (lhs, rhs) {
        if parse_numeric(a).is_none() || parse_numeric(b).is_none() {
            return Ok(ScalarValue::Bool(accept(a.cmp(b))));
        }
    }
    if matches!(lhs, ScalarValue::Array(_)) || matches!(rhs, ScalarValue::Array(_)) {
        return Err("arrays cannot be ordered");
    }

    let ordering = match (to_number(lhs)?, to_number(rhs)?) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
        (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
    };
    // NaN is unordered; every comparison against it is false
    Ok(ScalarValue::Bool(ordering.is_some_and(accept)))
}
