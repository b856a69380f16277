//! Shared types for Pyrite static reflection.
//!
//! This crate defines the value types that flow between the source locators
//! and the reflection model: lookup identifiers, located source text, evaluated
//! constant values, namespace contexts and the shapes of live types. The
//! syntax-node shapes an external parser must produce live in [`node`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub mod node;

/// Separator between namespace segments in a qualified name.
pub const NAMESPACE_SEPARATOR: char = '\\';

// ============================================================================
// Identifiers
// ============================================================================

/// What kind of declaration an [`Identifier`] asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Class,
    Function,
    Constant,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Class => f.write_str("class"),
            IdentifierKind::Function => f.write_str("function"),
            IdentifierKind::Constant => f.write_str("constant"),
        }
    }
}

/// A typed request key used to ask a source locator for a declaration.
///
/// Equality is by `(kind, name)`. Construction never fails; locators call
/// [`Identifier::validate`] before answering so that malformed keys surface
/// as an error at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Identifier {
    kind: IdentifierKind,
    name: String,
}

/// Returned by [`Identifier::validate`] for malformed lookup keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} identifier {name:?}: {reason}")]
pub struct InvalidIdentifier {
    pub kind: IdentifierKind,
    pub name: String,
    pub reason: &'static str,
}

impl Identifier {
    pub fn new(kind: IdentifierKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for a class identifier.
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(IdentifierKind::Class, name)
    }

    /// Shorthand for a function identifier.
    pub fn function(name: impl Into<String>) -> Self {
        Self::new(IdentifierKind::Function, name)
    }

    /// Shorthand for a constant identifier.
    pub fn constant(name: impl Into<String>) -> Self {
        Self::new(IdentifierKind::Constant, name)
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// The name exactly as requested.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name without a leading namespace separator (`\Foo\Bar` -> `Foo\Bar`).
    pub fn normalized_name(&self) -> &str {
        self.name
            .strip_prefix(NAMESPACE_SEPARATOR)
            .unwrap_or(&self.name)
    }

    pub fn is_class(&self) -> bool {
        self.kind == IdentifierKind::Class
    }

    pub fn is_function(&self) -> bool {
        self.kind == IdentifierKind::Function
    }

    pub fn is_constant(&self) -> bool {
        self.kind == IdentifierKind::Constant
    }

    /// Check that the name is a well-formed, optionally qualified, name.
    ///
    /// Every segment between separators must start with a letter, an
    /// underscore or a non-ASCII byte, followed by letters, digits,
    /// underscores or non-ASCII bytes.
    pub fn validate(&self) -> Result<(), InvalidIdentifier> {
        let invalid = |reason| InvalidIdentifier {
            kind: self.kind,
            name: self.name.clone(),
            reason,
        };

        let name = self.normalized_name();
        if name.is_empty() {
            return Err(invalid("name is empty"));
        }

        for segment in name.split(NAMESPACE_SEPARATOR) {
            let mut chars = segment.chars();
            match chars.next() {
                None => return Err(invalid("empty namespace segment")),
                Some(c) if !(c == '_' || c.is_ascii_alphabetic() || !c.is_ascii()) => {
                    return Err(invalid("segment must start with a letter or underscore"));
                }
                Some(_) => {}
            }
            if !chars.all(|c| c == '_' || c.is_ascii_alphanumeric() || !c.is_ascii()) {
                return Err(invalid("segment contains an invalid character"));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

// ============================================================================
// Located Source
// ============================================================================

/// Where a piece of located source text came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// Read from a file on disk
    FileBacked,
    /// Supplied directly as an in-memory string
    StringBacked,
    /// Regenerated from a live type's shape
    Synthesized,
}

/// Source text produced by a locator, tagged with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocatedSource {
    text: String,
    origin: OriginKind,
    /// Only set for file-backed sources
    file_name: Option<PathBuf>,
}

impl LocatedSource {
    pub fn from_file(text: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            origin: OriginKind::FileBacked,
            file_name: Some(path.into()),
        }
    }

    pub fn from_string(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: OriginKind::StringBacked,
            file_name: None,
        }
    }

    pub fn synthesized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: OriginKind::Synthesized,
            file_name: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> OriginKind {
        self.origin
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    pub fn is_synthesized(&self) -> bool {
        self.origin == OriginKind::Synthesized
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

// ============================================================================
// Scalar Values
// ============================================================================

/// The result of statically evaluating a constant expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
    Array(Vec<ScalarValue>),
}

impl ScalarValue {
    /// Name of the value's type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Int(_) => "int",
            ScalarValue::Float(_) => "float",
            ScalarValue::String(_) => "string",
            ScalarValue::Bool(_) => "bool",
            ScalarValue::Null => "null",
            ScalarValue::Array(_) => "array",
        }
    }

    /// Loose truthiness of the value.
    pub fn is_truthy(&self) -> bool {
        match self {
            ScalarValue::Int(i) => *i != 0,
            ScalarValue::Float(f) => *f != 0.0,
            ScalarValue::String(s) => !(s.is_empty() || s == "0"),
            ScalarValue::Bool(b) => *b,
            ScalarValue::Null => false,
            ScalarValue::Array(items) => !items.is_empty(),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

/// Renders the value as a source literal (`1`, `1.5`, `'a\'b'`, `[1, 2]`).
impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::Float(x) if x.is_nan() => f.write_str("NAN"),
            ScalarValue::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "INF" } else { "-INF" })
            }
            ScalarValue::Float(x) => write!(f, "{:?}", x),
            ScalarValue::String(s) => {
                write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Null => f.write_str("null"),
            ScalarValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

// ============================================================================
// Namespaces and Name Resolution
// ============================================================================

/// The namespace a declaration was parsed under.
///
/// An empty `parts` list is a namespace block without a name, which behaves
/// like the global namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NamespaceContext {
    parts: Vec<String>,
}

impl NamespaceContext {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a qualified namespace name such as `A\B` into its parts.
    pub fn parse(name: &str) -> Self {
        let name = name.trim_matches(NAMESPACE_SEPARATOR);
        if name.is_empty() {
            return Self::default();
        }
        Self::new(name.split(NAMESPACE_SEPARATOR))
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The joined namespace name (`A\B`), empty for an unnamed namespace.
    pub fn name(&self) -> String {
        self.parts.join("\\")
    }
}

/// Whether a declaration sits in a named namespace.
///
/// False for the global namespace and for a namespace block without a name.
pub fn in_namespace(namespace: Option<&NamespaceContext>) -> bool {
    namespace.is_some_and(|ns| !ns.is_empty())
}

/// Resolve a short name against its namespace context.
///
/// `("Foo", Some(A\B))` resolves to `A\B\Foo`; a global or unnamed
/// namespace leaves the short name unchanged.
pub fn fully_qualified_name(short_name: &str, namespace: Option<&NamespaceContext>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}\\{}", ns.name(), short_name),
        _ => short_name.to_string(),
    }
}

/// Split a fully qualified name into its namespace and short name.
pub fn split_qualified_name(name: &str) -> (Option<NamespaceContext>, &str) {
    let name = name.strip_prefix(NAMESPACE_SEPARATOR).unwrap_or(name);
    match name.rsplit_once(NAMESPACE_SEPARATOR) {
        Some((namespace, short)) => (Some(NamespaceContext::parse(namespace)), short),
        None => (None, name),
    }
}

// ============================================================================
// Live Type Shapes
// ============================================================================

/// Member visibility.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Protected => f.write_str("protected"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// The kind of a type registered in a running environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LiveTypeKind {
    Class,
    Interface,
    Trait,
}

/// The introspected shape of a type that is defined in a running environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveType {
    /// Fully qualified name, without a leading separator
    pub name: String,
    pub kind: LiveTypeKind,
    /// File the type was declared in; `None` for evaled declarations
    #[serde(default)]
    pub file_name: Option<PathBuf>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub constants: Vec<LiveConstant>,
    #[serde(default)]
    pub properties: Vec<LiveProperty>,
    #[serde(default)]
    pub methods: Vec<LiveMethod>,
}

impl LiveType {
    pub fn new(name: impl Into<String>, kind: LiveTypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            file_name: None,
            is_abstract: false,
            is_final: false,
            parent: None,
            interfaces: Vec::new(),
            constants: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// The name without its namespace.
    pub fn short_name(&self) -> &str {
        split_qualified_name(&self.name).1
    }

    /// The namespace the type was declared in, if any.
    pub fn namespace(&self) -> Option<NamespaceContext> {
        split_qualified_name(&self.name).0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveConstant {
    pub name: String,
    pub value: ScalarValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveProperty {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub default: Option<ScalarValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveMethod {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub parameters: Vec<LiveParameter>,
    #[serde(default)]
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveParameter {
    pub name: String,
    #[serde(default)]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub default: Option<ScalarValue>,
    #[serde(default)]
    pub is_variadic: bool,
    #[serde(default)]
    pub by_ref: bool,
}
