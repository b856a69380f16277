//! Static reflection model for Pyrite.
//!
//! This crate turns class declaration nodes into a read-only reflection model
//! shaped like a runtime reflection API: [`ClassInfo`] for the class,
//! [`MethodInfo`] for each method and [`ParameterInfo`] for each formal
//! parameter. Nothing is executed; constant values are folded statically by a
//! [`ConstantEvaluator`].
//!
//! # Example
//!
//! ```ignore
//! use pyrite_reflect::{ClassReflector, SourceParser};
//! use pyrite_locator::StringSourceLocator;
//!
//! let reflector = ClassReflector::new(
//!     StringSourceLocator::new(source)?,
//!     my_parser,
//! );
//!
//! let class = reflector.reflect_class("A\\B\\Foo")?;
//! let bar = class.method("bar")?;
//! println!("{} takes {} parameters", bar.name(), bar.number_of_parameters());
//! ```

use pyrite_locator::LocatorError;

pub mod class;
pub mod evaluator;
pub mod method;
pub mod parameter;
pub mod reflector;

pub use class::ClassInfo;
pub use evaluator::{ClassConstants, ConstantEvaluator, EvaluationContext, StaticEvaluator};
pub use method::{MethodInfo, ModifierFlags};
pub use parameter::ParameterInfo;
pub use reflector::{ClassReflector, ParseError, SourceParser};

/// Errors that can occur while building or querying the reflection model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not find method: {class}::{method}")]
    MethodNotFound { class: String, method: String },

    #[error("Could not find class: {0}")]
    ClassNotFound(String),

    #[error("Cannot evaluate {expression} in {subject}: {reason}")]
    UnsupportedExpression {
        subject: String,
        expression: String,
        reason: String,
    },

    #[error("Malformed {node} node: {reason}")]
    MalformedNode { node: &'static str, reason: String },

    #[error("Failed to parse source for {identifier}: {source}")]
    Parse {
        identifier: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Locator(#[from] LocatorError),
}

/// Result type for reflection operations.
pub type Result<T> = std::result::Result<T, Error>;
