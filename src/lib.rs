//! # 🔮 Pyrite - Static Class Reflection for PHP Sources
//!
//! Pyrite answers reflection questions about PHP classes without loading or
//! executing them. Source is found by pluggable locators, parsed by whatever
//! parser you bring, and turned into an immutable reflection model shaped like
//! the runtime reflection API.
//!
//! ## ✨ Quick Start
//!
//! ```ignore
//! use pyrite::{ClassReflector, SingleFileSourceLocator};
//!
//! let reflector = ClassReflector::new(
//!     SingleFileSourceLocator::new("src/Foo.php")?,
//!     my_parser,
//! );
//!
//! let foo = reflector.reflect_class("A\\B\\Foo")?;
//! for method in foo.methods() {
//!     println!(
//!         "{}::{} ({} required of {})",
//!         foo.name(),
//!         method.name(),
//!         method.number_of_required_parameters(),
//!         method.number_of_parameters(),
//!     );
//! }
//!
//! if let Some(value) = foo.constant("VERSION") {
//!     println!("VERSION = {}", value);
//! }
//! ```
//!
//! ### Chaining Locators
//!
//! Locators are strategies; the first one that finds something wins. File
//! and string locators answer every identifier, so they go last:
//!
//! ```ignore
//! use pyrite::{AggregateSourceLocator, EvaledSourceLocator, SingleFileSourceLocator, TypeRegistry};
//!
//! let registry = TypeRegistry::from_json(&snapshot)?;
//! let locator = AggregateSourceLocator::default()
//!     .with(EvaledSourceLocator::new(registry))
//!     .with(SingleFileSourceLocator::new("src/Foo.php")?);
//! ```
//!
//! ## 🏗️ Architecture
//!
//! - **[`pyrite_types`]**: Identifiers, located source, scalar values,
//!   namespace contexts and the syntax-node shapes a parser must produce
//! - **[`pyrite_locator`]**: Source locators, including synthesis of source
//!   for classes that only exist in a running environment
//! - **[`pyrite_reflect`]**: The reflection model and the constant evaluator
//!
//! ## 📚 Learn More
//!
//! - [Reflection model](pyrite_reflect)
//! - [Locators](pyrite_locator)
//! - [Syntax nodes](pyrite_types::node)

// Re-export the reflection model
pub use pyrite_reflect::{
    ClassConstants, ClassInfo, ClassReflector, ConstantEvaluator, Error, EvaluationContext,
    MethodInfo, ModifierFlags, ParameterInfo, ParseError, Result, SourceParser, StaticEvaluator,
};

// Re-export the locators
pub use pyrite_locator::{
    AggregateSourceLocator, DeclarationGenerator, DefaultDeclarationGenerator,
    EvaledSourceLocator, LiveEnvironment, LocatorError, SOURCE_PREAMBLE,
    SingleFileSourceLocator, SourceLocator, StringSourceLocator, TypeRegistry,
};

// Re-export common types
pub use pyrite_types::node;
pub use pyrite_types::{
    Identifier, IdentifierKind, InvalidIdentifier, LiveType, LiveTypeKind, LocatedSource,
    NamespaceContext, OriginKind, ScalarValue, Visibility,
};
