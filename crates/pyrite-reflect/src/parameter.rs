//! Reflected formal parameters.

use std::fmt;

use pyrite_types::ScalarValue;
use pyrite_types::node::{Expr, ParamNode};

use crate::class::ClassInfo;
use crate::evaluator::{ConstantEvaluator, EvaluationContext};
use crate::method::MethodInfo;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParameterData {
    name: String,
    type_hint: Option<String>,
    default: Option<Expr>,
    variadic: bool,
    by_ref: bool,
}

impl ParameterData {
    pub(crate) fn from_node(node: &ParamNode) -> Self {
        Self {
            name: node.name.clone(),
            type_hint: node.type_hint.clone(),
            default: node.default.clone(),
            variadic: node.variadic,
            by_ref: node.by_ref,
        }
    }

    pub(crate) fn is_optional(&self) -> bool {
        self.default.is_some() || self.variadic
    }
}

/// A formal parameter of a reflected method.
#[derive(Clone, Copy)]
pub struct ParameterInfo<'a> {
    method: MethodInfo<'a>,
    position: usize,
    data: &'a ParameterData,
}

impl<'a> ParameterInfo<'a> {
    pub(crate) fn new(method: MethodInfo<'a>, position: usize, data: &'a ParameterData) -> Self {
        Self {
            method,
            position,
            data,
        }
    }

    /// Name without the `$` sigil.
    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    /// Zero-based position in the parameter list.
    pub fn position(&self) -> usize {
        self.position
    }

    /// A parameter with a default value, or a variadic one, may be omitted.
    pub fn is_optional(&self) -> bool {
        self.data.is_optional()
    }

    pub fn has_default_value(&self) -> bool {
        self.data.default.is_some()
    }

    /// The unevaluated default value expression, if any.
    pub fn default_value_expression(&self) -> Option<&'a Expr> {
        self.data.default.as_ref()
    }

    /// Fold the default value expression into a scalar.
    ///
    /// `self::NAME` in the default resolves against the declaring class's
    /// constants.
    pub fn default_value(&self, evaluator: &dyn ConstantEvaluator) -> Result<Option<ScalarValue>> {
        let Some(expr) = &self.data.default else {
            return Ok(None);
        };

        let class = self.declaring_class();
        let class_name = class.name();
        let subject = format!("{}::{}(${})", class_name, self.method.name(), self.data.name);
        let context = EvaluationContext::new(&subject).in_class(&class_name, class.constants());
        evaluator.evaluate(expr, &context).map(Some)
    }

    pub fn type_hint(&self) -> Option<&'a str> {
        self.data.type_hint.as_deref()
    }

    pub fn is_variadic(&self) -> bool {
        self.data.variadic
    }

    pub fn is_passed_by_reference(&self) -> bool {
        self.data.by_ref
    }

    pub fn declaring_function(&self) -> MethodInfo<'a> {
        self.method
    }

    pub fn declaring_class(&self) -> &'a ClassInfo {
        self.method.declaring_class()
    }
}

impl PartialEq for ParameterInfo<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && std::ptr::eq(self.data, other.data)
    }
}

impl Eq for ParameterInfo<'_> {}

impl fmt::Debug for ParameterInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterInfo")
            .field("method", &self.method.name())
            .field("position", &self.position)
            .field("name", &self.data.name)
            .field("optional", &self.is_optional())
            .finish()
    }
}
