//! Locate, parse and reflect classes by name.

use std::sync::Arc;

use log::{debug, warn};
use pyrite_locator::SourceLocator;
use pyrite_types::node::{ClassNode, Stmt};
use pyrite_types::{Identifier, LocatedSource, NamespaceContext};

use crate::class::ClassInfo;
use crate::evaluator::{ConstantEvaluator, StaticEvaluator};
use crate::{Error, Result};

/// A parser failed to turn source text into statements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Turns located source text into top-level statements.
///
/// Pyrite ships no parser of its own; any parser producing
/// [`pyrite_types::node`] shapes can be plugged in here.
pub trait SourceParser: Send + Sync {
    fn parse(&self, source: &LocatedSource) -> std::result::Result<Vec<Stmt>, ParseError>;
}

impl<P: SourceParser + ?Sized> SourceParser for &P {
    fn parse(&self, source: &LocatedSource) -> std::result::Result<Vec<Stmt>, ParseError> {
        (**self).parse(source)
    }
}

impl<P: SourceParser + ?Sized> SourceParser for Arc<P> {
    fn parse(&self, source: &LocatedSource) -> std::result::Result<Vec<Stmt>, ParseError> {
        (**self).parse(source)
    }
}

/// Reflects classes by fully qualified name.
pub struct ClassReflector<L, P> {
    locator: L,
    parser: P,
    evaluator: Box<dyn ConstantEvaluator>,
}

impl<L: SourceLocator, P: SourceParser> ClassReflector<L, P> {
    pub fn new(locator: L, parser: P) -> Self {
        Self {
            locator,
            parser,
            evaluator: Box::new(StaticEvaluator),
        }
    }

    /// Fold constants with a different evaluator.
    pub fn with_evaluator(mut self, evaluator: impl ConstantEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Reflect the class with the given fully qualified name.
    ///
    /// A leading `\` on `name` is ignored. The locator is asked once; if the
    /// source it returns does not declare the class, the result is
    /// [`Error::ClassNotFound`].
    pub fn reflect_class(&self, name: &str) -> Result<ClassInfo> {
        let identifier = Identifier::class(name);
        let wanted = identifier.normalized_name();

        let Some(source) = self.locator.locate(&identifier)? else {
            debug!("No source located for {}", identifier);
            return Err(Error::ClassNotFound(wanted.to_string()));
        };

        let stmts = self.parse(&identifier, &source)?;
        let found = declared_classes(&stmts)
            .into_iter()
            .find(|(node, namespace)| {
                pyrite_types::fully_qualified_name(&node.name, namespace.as_deref()) == wanted
            });

        match found {
            Some((node, namespace)) => {
                ClassInfo::from_node_with(node, namespace, self.evaluator.as_ref())
            }
            None => {
                warn!("Source located for {} does not declare it", identifier);
                Err(Error::ClassNotFound(wanted.to_string()))
            }
        }
    }

    /// Reflect every class declared in `source`, in declaration order.
    pub fn reflect_all_classes(&self, source: &LocatedSource) -> Result<Vec<ClassInfo>> {
        let label = match source.file_name() {
            Some(path) => path.display().to_string(),
            None => format!("{:?} source", source.origin()),
        };
        let stmts = self
            .parser
            .parse(source)
            .map_err(|source| Error::Parse {
                identifier: label,
                source,
            })?;

        declared_classes(&stmts)
            .into_iter()
            .map(|(node, namespace)| {
                ClassInfo::from_node_with(node, namespace, self.evaluator.as_ref())
            })
            .collect()
    }

    fn parse(&self, identifier: &Identifier, source: &LocatedSource) -> Result<Vec<Stmt>> {
        self.parser.parse(source).map_err(|source| Error::Parse {
            identifier: identifier.to_string(),
            source,
        })
    }
}

impl<L: std::fmt::Debug, P> std::fmt::Debug for ClassReflector<L, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassReflector")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

type DeclaredClass<'a> = (&'a ClassNode, Option<Arc<NamespaceContext>>);

/// Class declarations with the namespace each one sits in.
///
/// All classes of one namespace block share a single context.
fn declared_classes(stmts: &[Stmt]) -> Vec<DeclaredClass<'_>> {
    let mut classes = Vec::new();
    collect_classes(stmts, None, &mut classes);
    classes
}

fn collect_classes<'a>(
    stmts: &'a [Stmt],
    namespace: Option<Arc<NamespaceContext>>,
    out: &mut Vec<DeclaredClass<'a>>,
) {
    for stmt in stmts {
        match stmt {
            Stmt::Namespace(block) => {
                let context = Arc::new(block.name.clone().unwrap_or_default());
                collect_classes(&block.stmts, Some(context), out);
            }
            Stmt::Class(node) => out.push((node, namespace.clone())),
            Stmt::Other => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_locator::{
        AggregateSourceLocator, EvaledSourceLocator, LocatorError, StringSourceLocator,
        TypeRegistry,
    };
    use pyrite_types::{LiveType, LiveTypeKind, ScalarValue};
    use serde_json::json;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Ignores the text and returns a fixed tree.
    struct FixedParser(Vec<Stmt>);

    impl SourceParser for FixedParser {
        fn parse(&self, _: &LocatedSource) -> std::result::Result<Vec<Stmt>, ParseError> {
            Ok(self.0.clone())
        }
    }

    struct FailingParser;

    impl SourceParser for FailingParser {
        fn parse(&self, _: &LocatedSource) -> std::result::Result<Vec<Stmt>, ParseError> {
            Err(ParseError::new("unexpected end of file"))
        }
    }

    fn tree() -> Vec<Stmt> {
        serde_json::from_value(json!([
            { "type": "other" },
            {
                "type": "namespace",
                "name": { "parts": ["A", "B"] },
                "stmts": [
                    {
                        "type": "class",
                        "name": "Foo",
                        "stmts": [{
                            "type": "method",
                            "name": "bar",
                            "params": [
                                { "name": "x", "type_hint": "int" },
                                { "name": "y", "type_hint": "int", "default": { "type": "int", "value": 5 } }
                            ]
                        }]
                    },
                    { "type": "class", "name": "Helper" }
                ]
            },
            {
                "type": "namespace",
                "stmts": [{
                    "type": "class",
                    "name": "Baz",
                    "stmts": [{
                        "type": "class_const",
                        "consts": [{ "name": "FOO", "value": {
                            "type": "binary", "op": "plus",
                            "lhs": { "type": "int", "value": 1 },
                            "rhs": { "type": "int", "value": 1 }
                        } }]
                    }]
                }]
            }
        ]))
        .unwrap()
    }

    fn reflector() -> ClassReflector<StringSourceLocator, FixedParser> {
        ClassReflector::new(
            StringSourceLocator::new("<?php // parsed by FixedParser").unwrap(),
            FixedParser(tree()),
        )
    }

    #[test]
    fn test_reflect_namespaced_class() {
        init_logging();
        let class = reflector().reflect_class("A\\B\\Foo").unwrap();
        assert_eq!(class.name(), "A\\B\\Foo");

        let bar = class.method("bar").unwrap();
        assert_eq!(bar.number_of_parameters(), 2);
        assert_eq!(bar.number_of_required_parameters(), 1);
    }

    #[test]
    fn test_leading_separator_is_ignored() {
        let class = reflector().reflect_class("\\A\\B\\Foo").unwrap();
        assert_eq!(class.short_name(), "Foo");
    }

    #[test]
    fn test_unnamed_namespace_is_global() {
        let class = reflector().reflect_class("Baz").unwrap();
        assert!(!class.in_namespace());
        assert_eq!(class.constant("FOO"), Some(&ScalarValue::Int(2)));
    }

    #[test]
    fn test_undeclared_class() {
        init_logging();
        let err = reflector().reflect_class("A\\B\\Missing").unwrap_err();
        assert_eq!(err.to_string(), "Could not find class: A\\B\\Missing");

        // right short name, wrong namespace
        assert!(matches!(
            reflector().reflect_class("Foo"),
            Err(Error::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_classes_of_one_block_share_a_namespace() {
        let classes = reflector()
            .reflect_all_classes(&LocatedSource::from_string("<?php"))
            .unwrap();
        let names: Vec<_> = classes.iter().map(ClassInfo::name).collect();
        assert_eq!(names, vec!["A\\B\\Foo", "A\\B\\Helper", "Baz"]);

        assert!(Arc::ptr_eq(
            classes[0].namespace().unwrap(),
            classes[1].namespace().unwrap()
        ));
    }

    #[test]
    fn test_parse_failure() {
        let reflector = ClassReflector::new(
            StringSourceLocator::new("<?php class {").unwrap(),
            FailingParser,
        );
        let err = reflector.reflect_class("Foo").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(
            err.to_string(),
            "Failed to parse source for class Foo: unexpected end of file"
        );
    }

    #[test]
    fn test_nothing_located() {
        let reflector = ClassReflector::new(AggregateSourceLocator::default(), FixedParser(tree()));
        assert!(matches!(
            reflector.reflect_class("A\\B\\Foo"),
            Err(Error::ClassNotFound(name)) if name == "A\\B\\Foo"
        ));
    }

    #[test]
    fn test_invalid_name_is_a_locator_error() {
        let err = reflector().reflect_class("A\\\\Foo").unwrap_err();
        assert!(matches!(
            err,
            Error::Locator(LocatorError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_reflect_from_live_environment() {
        init_logging();
        let mut live = LiveType::new("App\\Loaded", LiveTypeKind::Class);
        live.file_name = Some("/app/Loaded.php".into());
        let locator = EvaledSourceLocator::new(TypeRegistry::new().with(live));

        let parsed: Vec<Stmt> = serde_json::from_value(json!([{
            "type": "namespace",
            "name": { "parts": ["App"] },
            "stmts": [{ "type": "class", "name": "Loaded" }]
        }]))
        .unwrap();

        let reflector = ClassReflector::new(locator, FixedParser(parsed));
        let class = reflector.reflect_class("App\\Loaded").unwrap();
        assert_eq!(class.namespace_name(), "App");
        assert!(class.methods().is_empty());
    }

    /// Synthesized source declares `App\Loaded`, anything else `Other`.
    struct OriginParser;

    impl SourceParser for OriginParser {
        fn parse(&self, source: &LocatedSource) -> std::result::Result<Vec<Stmt>, ParseError> {
            let tree = if source.is_synthesized() {
                json!([{
                    "type": "namespace",
                    "name": { "parts": ["App"] },
                    "stmts": [{ "type": "class", "name": "Loaded" }]
                }])
            } else {
                json!([{ "type": "class", "name": "Other" }])
            };
            serde_json::from_value(tree).map_err(|err| ParseError::new(err.to_string()))
        }
    }

    #[test]
    fn test_live_class_through_chain_with_string_fallback() {
        init_logging();
        let mut live = LiveType::new("App\\Loaded", LiveTypeKind::Class);
        live.file_name = Some("/app/Loaded.php".into());

        let locator = AggregateSourceLocator::default()
            .with(EvaledSourceLocator::new(TypeRegistry::new().with(live)))
            .with(StringSourceLocator::new("<?php class Other {}").unwrap());
        let reflector = ClassReflector::new(locator, OriginParser);

        let loaded = reflector.reflect_class("App\\Loaded").unwrap();
        assert_eq!(loaded.name(), "App\\Loaded");

        // not live, so the string locator answers
        let other = reflector.reflect_class("Other").unwrap();
        assert_eq!(other.name(), "Other");
    }
}
