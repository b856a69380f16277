use log::debug;

use crate::{Identifier, LocatedSource, LocatorError, Result, SourceLocator};

/// Serves a fixed, in-memory source string for every identifier.
///
/// Whether the string actually declares the requested name is decided later,
/// when the parsed tree is searched. Since it never misses, put it last in an
/// [`AggregateSourceLocator`](crate::AggregateSourceLocator).
#[derive(Debug, Clone)]
pub struct StringSourceLocator {
    source: String,
}

impl StringSourceLocator {
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(LocatorError::EmptySource);
        }
        Ok(Self { source })
    }
}

impl SourceLocator for StringSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedSource>> {
        identifier.validate()?;
        debug!("Serving in-memory source for {}", identifier);
        Ok(Some(LocatedSource::from_string(self.source.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OriginKind;

    #[test]
    fn test_locates_any_valid_identifier() {
        let locator = StringSourceLocator::new("<?php class Foo {}").unwrap();

        let source = locator.locate(&Identifier::class("Foo")).unwrap().unwrap();
        assert_eq!(source.text(), "<?php class Foo {}");
        assert_eq!(source.origin(), OriginKind::StringBacked);
        assert!(source.file_name().is_none());

        assert!(locator.locate(&Identifier::function("bar")).unwrap().is_some());
    }

    #[test]
    fn test_rejects_empty_source() {
        assert!(matches!(
            StringSourceLocator::new("  \n"),
            Err(LocatorError::EmptySource)
        ));
    }

    #[test]
    fn test_invalid_identifier_is_an_error() {
        let locator = StringSourceLocator::new("<?php").unwrap();
        let result = locator.locate(&Identifier::class("Not Valid"));
        assert!(matches!(result, Err(LocatorError::InvalidIdentifier(_))));
    }
}
