//! Source locators for Pyrite.
//!
//! A [`SourceLocator`] answers one question: given an [`Identifier`], is there
//! source text that declares it, and if so, what is it? Locators are
//! strategies that can be chained with [`AggregateSourceLocator`]; the first
//! one to produce a [`LocatedSource`] wins. [`SingleFileSourceLocator`] and
//! [`StringSourceLocator`] answer every valid identifier, so they must come
//! last in a chain or nothing after them is ever asked.
//!
//! # Example
//!
//! ```ignore
//! use pyrite_locator::{AggregateSourceLocator, EvaledSourceLocator, SingleFileSourceLocator};
//!
//! let locator = AggregateSourceLocator::new(vec![
//!     Box::new(EvaledSourceLocator::new(registry)),
//!     Box::new(SingleFileSourceLocator::new("src/Foo.php")?),
//! ]);
//!
//! if let Some(source) = locator.locate(&Identifier::class("App\\Foo"))? {
//!     println!("{}", source.text());
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

pub use pyrite_types::{Identifier, IdentifierKind, InvalidIdentifier, LocatedSource, OriginKind};

mod aggregate;
mod environment;
mod evaled;
mod file;
mod generator;
mod string;

pub use aggregate::AggregateSourceLocator;
pub use environment::{LiveEnvironment, TypeRegistry};
pub use evaled::EvaledSourceLocator;
pub use file::SingleFileSourceLocator;
pub use generator::{DeclarationGenerator, DefaultDeclarationGenerator};
pub use string::StringSourceLocator;

/// Opening tag every located source unit starts with.
pub const SOURCE_PREAMBLE: &str = "<?php\n\n";

/// Errors that can occur while locating source.
///
/// Not finding anything is not an error: locators return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    #[error("Source file {0:?} does not exist or is not a regular file")]
    InvalidFileLocation(PathBuf),

    #[error("Source string must not be empty")]
    EmptySource,

    #[error("Failed to read source file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for locator operations.
pub type Result<T> = std::result::Result<T, LocatorError>;

/// A strategy for finding the source text of a declaration.
pub trait SourceLocator: Send + Sync {
    /// Locate source for `identifier`.
    ///
    /// Returns `Ok(None)` when this locator has nothing for the identifier,
    /// and an error only for genuine failures such as a malformed identifier.
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedSource>>;
}

impl<L: SourceLocator + ?Sized> SourceLocator for Box<L> {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedSource>> {
        (**self).locate(identifier)
    }
}

impl<L: SourceLocator + ?Sized> SourceLocator for Arc<L> {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedSource>> {
        (**self).locate(identifier)
    }
}

impl<L: SourceLocator + ?Sized> SourceLocator for &L {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedSource>> {
        (**self).locate(identifier)
    }
}
