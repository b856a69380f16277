//! Reflected classes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};
use pyrite_types::node::{ClassNode, Expr};
use pyrite_types::{NAMESPACE_SEPARATOR, NamespaceContext, ScalarValue};

use crate::evaluator::{ClassConstants, ConstantEvaluator, EvaluationContext, StaticEvaluator};
use crate::method::{MethodData, MethodInfo};
use crate::{Error, Result};

/// Read-only reflection of a single class declaration.
///
/// Built once from a [`ClassNode`] and never mutated afterwards. Methods and
/// parameters are handed out as borrowed handles, so a `ClassInfo` can be
/// shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    short_name: String,
    namespace: Option<Arc<NamespaceContext>>,
    methods: Vec<MethodData>,
    constants: IndexMap<String, ScalarValue>,
}

impl ClassInfo {
    /// Build the model from a class node, folding constants with
    /// [`StaticEvaluator`].
    pub fn from_node(node: &ClassNode, namespace: Option<Arc<NamespaceContext>>) -> Result<Self> {
        Self::from_node_with(node, namespace, &StaticEvaluator)
    }

    /// Build the model from a class node with a caller-supplied evaluator.
    ///
    /// Constants may refer to each other in any order; a reference cycle is
    /// an error. A name declared twice keeps the last value. Any failure
    /// aborts construction; no partial model is returned.
    pub fn from_node_with(
        node: &ClassNode,
        namespace: Option<Arc<NamespaceContext>>,
        evaluator: &dyn ConstantEvaluator,
    ) -> Result<Self> {
        if node.name.is_empty() || node.name.contains(NAMESPACE_SEPARATOR) {
            return Err(Error::MalformedNode {
                node: "class",
                reason: format!("invalid class name {:?}", node.name),
            });
        }

        let name = pyrite_types::fully_qualified_name(&node.name, namespace.as_deref());

        let methods = node
            .methods()
            .map(|method| MethodData::from_node(method, &name))
            .collect::<Result<Vec<_>>>()?;

        let mut declarations = IndexMap::new();
        for declaration in node.constants() {
            for constant in &declaration.consts {
                if constant.name.is_empty() {
                    return Err(Error::MalformedNode {
                        node: "constant",
                        reason: format!("constant in {} has no name", name),
                    });
                }
                declarations.insert(constant.name.as_str(), &constant.value);
            }
        }
        let constants = ConstantTable::new(&name, declarations, evaluator).resolve_all()?;

        debug!(
            "Reflected {} ({} methods, {} constants)",
            name,
            methods.len(),
            constants.len()
        );

        Ok(Self {
            short_name: node.name.clone(),
            namespace,
            methods,
            constants,
        })
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Fully qualified name, e.g. `A\B\Foo`.
    pub fn name(&self) -> String {
        pyrite_types::fully_qualified_name(&self.short_name, self.namespace.as_deref())
    }

    /// Namespace name, empty for the global namespace.
    pub fn namespace_name(&self) -> String {
        self.namespace
            .as_deref()
            .map(NamespaceContext::name)
            .unwrap_or_default()
    }

    pub fn in_namespace(&self) -> bool {
        pyrite_types::in_namespace(self.namespace.as_deref())
    }

    /// The namespace context this class was declared in.
    pub fn namespace(&self) -> Option<&Arc<NamespaceContext>> {
        self.namespace.as_ref()
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> Vec<MethodInfo<'_>> {
        self.methods
            .iter()
            .map(|data| MethodInfo::new(self, data))
            .collect()
    }

    /// Look up a method by exact, case-sensitive name.
    pub fn method(&self, name: &str) -> Result<MethodInfo<'_>> {
        self.methods
            .iter()
            .find(|data| data.name == name)
            .map(|data| MethodInfo::new(self, data))
            .ok_or_else(|| Error::MethodNotFound {
                class: self.name(),
                method: name.to_string(),
            })
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|data| data.name == name)
    }

    /// Constant values in first-declaration order.
    pub fn constants(&self) -> &IndexMap<String, ScalarValue> {
        &self.constants
    }

    pub fn constant(&self, name: &str) -> Option<&ScalarValue> {
        self.constants.get(name)
    }

    pub fn has_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }
}

/// Folds the constants of one class on demand, so an initializer may refer
/// to a constant declared after it.
struct ConstantTable<'a> {
    class_name: &'a str,
    declarations: IndexMap<&'a str, &'a Expr>,
    evaluator: &'a dyn ConstantEvaluator,
    values: RefCell<HashMap<&'a str, ScalarValue>>,
    /// Constants whose initializer is currently being evaluated
    pending: RefCell<Vec<&'a str>>,
}

impl<'a> ConstantTable<'a> {
    fn new(
        class_name: &'a str,
        declarations: IndexMap<&'a str, &'a Expr>,
        evaluator: &'a dyn ConstantEvaluator,
    ) -> Self {
        Self {
            class_name,
            declarations,
            evaluator,
            values: RefCell::new(HashMap::new()),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Every constant in first-declaration order.
    fn resolve_all(&self) -> Result<IndexMap<String, ScalarValue>> {
        self.declarations
            .iter()
            .map(|(&name, &expr)| {
                let value = self.value_of(name, expr)?;
                trace!("{}::{} = {}", self.class_name, name, value);
                Ok((name.to_string(), value))
            })
            .collect()
    }

    fn value_of(&self, name: &'a str, expr: &'a Expr) -> Result<ScalarValue> {
        if let Some(value) = self.values.borrow().get(name) {
            return Ok(value.clone());
        }

        let subject = format!("{}::{}", self.class_name, name);
        if self.pending.borrow().contains(&name) {
            return Err(Error::UnsupportedExpression {
                subject,
                expression: expr.describe(),
                reason: "constant refers to itself".to_string(),
            });
        }

        self.pending.borrow_mut().push(name);
        let context = EvaluationContext::new(&subject).in_class(self.class_name, self);
        let result = self.evaluator.evaluate(expr, &context);
        self.pending.borrow_mut().pop();

        let value = result?;
        self.values.borrow_mut().insert(name, value.clone());
        Ok(value)
    }
}

impl ClassConstants for ConstantTable<'_> {
    fn resolve(&self, name: &str) -> Option<Result<ScalarValue>> {
        let (&name, &expr) = self.declarations.get_key_value(name)?;
        Some(self.value_of(name, expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModifierFlags;
    use pyrite_types::node::{BinaryOp, ClassConstNode, ClassStmt, ConstNode, Expr};
    use serde_json::json;

    fn ns(name: &str) -> Option<Arc<NamespaceContext>> {
        Some(Arc::new(NamespaceContext::parse(name)))
    }

    fn foo() -> ClassNode {
        serde_json::from_value(json!({
            "name": "Foo",
            "stmts": [
                {
                    "type": "method",
                    "name": "bar",
                    "modifiers": ["public"],
                    "params": [
                        { "name": "x", "type_hint": "int" },
                        { "name": "y", "type_hint": "int", "default": { "type": "int", "value": 5 } }
                    ]
                },
                { "type": "other" },
                { "type": "method", "name": "__construct" },
                { "type": "method", "name": "hidden", "modifiers": ["private", "static"] }
            ]
        }))
        .unwrap()
    }

    fn consts(pairs: Vec<(&str, Expr)>) -> ClassStmt {
        ClassStmt::ClassConst(ClassConstNode {
            consts: pairs
                .into_iter()
                .map(|(name, value)| ConstNode {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        })
    }

    #[test]
    fn test_namespaced_class() {
        let class = ClassInfo::from_node(&foo(), ns("A\\B")).unwrap();

        assert_eq!(class.short_name(), "Foo");
        assert_eq!(class.name(), "A\\B\\Foo");
        assert_eq!(class.namespace_name(), "A\\B");
        assert!(class.in_namespace());

        let bar = class.method("bar").unwrap();
        assert_eq!(bar.number_of_parameters(), 2);
        assert_eq!(bar.number_of_required_parameters(), 1);
        assert!(bar.is_public());
        assert!(!bar.is_constructor());
    }

    #[test]
    fn test_global_class() {
        let class = ClassInfo::from_node(&foo(), None).unwrap();
        assert_eq!(class.name(), "Foo");
        assert_eq!(class.namespace_name(), "");
        assert!(!class.in_namespace());

        // unnamed namespace block
        let class = ClassInfo::from_node(&foo(), Some(Arc::new(NamespaceContext::default()))).unwrap();
        assert_eq!(class.name(), "Foo");
        assert!(!class.in_namespace());
    }

    #[test]
    fn test_namespace_is_shared() {
        let namespace = ns("A\\B");
        let class = ClassInfo::from_node(&foo(), namespace.clone()).unwrap();
        assert!(Arc::ptr_eq(
            class.namespace().unwrap(),
            namespace.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_methods_in_declaration_order() {
        let class = ClassInfo::from_node(&foo(), None).unwrap();
        let names: Vec<_> = class.methods().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["bar", "__construct", "hidden"]);

        assert!(class.method("__construct").unwrap().is_constructor());

        let hidden = class.method("hidden").unwrap();
        assert_eq!(hidden.modifiers(), ModifierFlags::PRIVATE | ModifierFlags::STATIC);
        assert!(!hidden.is_public());
    }

    #[test]
    fn test_method_lookup_is_case_sensitive() {
        let class = ClassInfo::from_node(&foo(), ns("A\\B")).unwrap();
        assert!(class.has_method("bar"));
        assert!(!class.has_method("BAR"));

        let err = class.method("BAR").unwrap_err();
        assert_eq!(err.to_string(), "Could not find method: A\\B\\Foo::BAR");
    }

    #[test]
    fn test_declaring_class_is_the_same_object() {
        let class = ClassInfo::from_node(&foo(), None).unwrap();
        for method in class.methods() {
            assert!(std::ptr::eq(method.declaring_class(), &class));
            for param in method.parameters() {
                assert_eq!(param.declaring_function(), method);
            }
        }
    }

    #[test]
    fn test_constant_is_folded() {
        let node = ClassNode {
            name: "Baz".to_string(),
            stmts: vec![consts(vec![(
                "FOO",
                Expr::binary(BinaryOp::Plus, Expr::int(1), Expr::int(1)),
            )])],
        };
        let class = ClassInfo::from_node(&node, None).unwrap();
        assert_eq!(class.constant("FOO"), Some(&ScalarValue::Int(2)));
        assert!(class.has_constant("FOO"));
        assert_eq!(class.constant("BAR"), None);
    }

    #[test]
    fn test_duplicate_constant_last_write_wins() {
        let node = ClassNode {
            name: "Baz".to_string(),
            stmts: vec![
                consts(vec![("A", Expr::int(1)), ("B", Expr::int(2))]),
                consts(vec![("A", Expr::int(3))]),
            ],
        };
        let class = ClassInfo::from_node(&node, None).unwrap();
        let constants: Vec<_> = class
            .constants()
            .iter()
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect();
        assert_eq!(
            constants,
            vec![("A", ScalarValue::Int(3)), ("B", ScalarValue::Int(2))]
        );
    }

    #[test]
    fn test_constant_refers_to_earlier_constant() {
        let node = ClassNode {
            name: "Sizes".to_string(),
            stmts: vec![consts(vec![
                ("KB", Expr::int(1024)),
                (
                    "MB",
                    Expr::binary(
                        BinaryOp::Mul,
                        Expr::ClassConstFetch {
                            class: "self".to_string(),
                            name: "KB".to_string(),
                        },
                        Expr::int(1024),
                    ),
                ),
            ])],
        };
        let class = ClassInfo::from_node(&node, ns("Units")).unwrap();
        assert_eq!(class.constant("MB"), Some(&ScalarValue::Int(1024 * 1024)));
    }

    #[test]
    fn test_unsupported_constant_aborts_construction() {
        let node = ClassNode {
            name: "Clock".to_string(),
            stmts: vec![consts(vec![
                ("OK", Expr::int(1)),
                (
                    "NOW",
                    Expr::Call {
                        name: "time".to_string(),
                        args: vec![],
                    },
                ),
            ])],
        };
        let err = ClassInfo::from_node(&node, ns("App")).unwrap_err();
        match err {
            Error::UnsupportedExpression { subject, .. } => assert_eq!(subject, "App\\Clock::NOW"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_evaluator() {
        struct AlwaysNull;

        impl ConstantEvaluator for AlwaysNull {
            fn evaluate(&self, _: &Expr, _: &EvaluationContext<'_>) -> Result<ScalarValue> {
                Ok(ScalarValue::Null)
            }
        }

        let node = ClassNode {
            name: "Baz".to_string(),
            stmts: vec![consts(vec![("FOO", Expr::int(7))])],
        };
        let class = ClassInfo::from_node_with(&node, None, &AlwaysNull).unwrap();
        assert_eq!(class.constant("FOO"), Some(&ScalarValue::Null));
    }

    #[test]
    fn test_invalid_class_name() {
        let mut node = foo();
        node.name = String::new();
        assert!(matches!(
            ClassInfo::from_node(&node, None),
            Err(Error::MalformedNode { node: "class", .. })
        ));

        node.name = "A\\Foo".to_string();
        assert!(ClassInfo::from_node(&node, None).is_err());
    }

    #[test]
    fn test_construction_is_deterministic() {
        let first = ClassInfo::from_node(&foo(), ns("A\\B")).unwrap();
        let second = ClassInfo::from_node(&foo(), ns("A\\B")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_class() {
        let node = ClassNode {
            name: "Nothing".to_string(),
            stmts: vec![],
        };
        let class = ClassInfo::from_node(&node, None).unwrap();
        assert!(class.methods().is_empty());
        assert!(class.constants().is_empty());
    }

    fn self_fetch(name: &str) -> Expr {
        Expr::ClassConstFetch {
            class: "self".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_constant_refers_to_later_constant() {
        let node = ClassNode {
            name: "Foo".to_string(),
            stmts: vec![
                consts(vec![(
                    "B",
                    Expr::binary(BinaryOp::Plus, self_fetch("A"), Expr::int(1)),
                )]),
                consts(vec![("A", Expr::int(1))]),
            ],
        };
        let class = ClassInfo::from_node(&node, None).unwrap();
        assert_eq!(class.constant("B"), Some(&ScalarValue::Int(2)));

        let names: Vec<_> = class.constants().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_short_class_name_refers_to_own_constant() {
        let node = ClassNode {
            name: "Foo".to_string(),
            stmts: vec![consts(vec![
                ("A", Expr::int(20)),
                (
                    "B",
                    Expr::binary(
                        BinaryOp::Plus,
                        Expr::ClassConstFetch {
                            class: "Foo".to_string(),
                            name: "A".to_string(),
                        },
                        Expr::int(1),
                    ),
                ),
            ])],
        };
        let class = ClassInfo::from_node(&node, ns("App")).unwrap();
        assert_eq!(class.constant("B"), Some(&ScalarValue::Int(21)));
    }

    #[test]
    fn test_constant_cycle_is_rejected() {
        let node = ClassNode {
            name: "Loop".to_string(),
            stmts: vec![consts(vec![("A", self_fetch("B")), ("B", self_fetch("A"))])],
        };
        let err = ClassInfo::from_node(&node, None).unwrap_err();
        match err {
            Error::UnsupportedExpression {
                subject, reason, ..
            } => {
                assert_eq!(subject, "Loop::A");
                assert_eq!(reason, "constant refers to itself");
            }
            other => panic!("unexpected error: {other}"),
        }

        let node = ClassNode {
            name: "Own".to_string(),
            stmts: vec![consts(vec![("A", self_fetch("A"))])],
        };
        assert!(ClassInfo::from_node(&node, None).is_err());
    }

    #[test]
    fn test_modifier_queries_on_handles() {
        let node: ClassNode = serde_json::from_value(json!({
            "name": "Shape",
            "stmts": [
                { "type": "method", "name": "area", "modifiers": ["abstract", "public"] },
                { "type": "method", "name": "describe", "modifiers": ["final"] },
                { "type": "method", "name": "scale", "modifiers": ["protected"] },
                { "type": "method", "name": "unit", "modifiers": ["public", "static"] },
                { "type": "method", "name": "__destruct" }
            ]
        }))
        .unwrap();
        let class = ClassInfo::from_node(&node, None).unwrap();

        let area = class.method("area").unwrap();
        assert!(area.is_abstract());
        assert!(!area.is_final());
        assert!(area.is_public());

        let describe = class.method("describe").unwrap();
        assert!(describe.is_final());
        assert!(!describe.is_abstract());
        assert!(describe.is_public());

        let scale = class.method("scale").unwrap();
        assert!(scale.is_protected());
        assert!(!scale.is_public());
        assert!(!scale.is_private());
        assert!(!scale.is_static());

        let unit = class.method("unit").unwrap();
        assert!(unit.is_static());
        assert!(!unit.is_protected());

        let destructor = class.method("__destruct").unwrap();
        assert!(destructor.is_destructor());
        assert!(!destructor.is_constructor());
        assert!(!area.is_destructor());
    }
}
