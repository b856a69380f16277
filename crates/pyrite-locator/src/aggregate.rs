use log::{debug, trace};

use crate::{Identifier, LocatedSource, Result, SourceLocator};

/// Tries a list of locators in order and returns the first hit.
///
/// An error from any member aborts the lookup; later members are not tried.
#[derive(Default)]
pub struct AggregateSourceLocator {
    locators: Vec<Box<dyn SourceLocator>>,
}

impl AggregateSourceLocator {
    pub fn new(locators: Vec<Box<dyn SourceLocator>>) -> Self {
        Self { locators }
    }

    /// Append a locator to the end of the chain.
    pub fn with(mut self, locator: impl SourceLocator + 'static) -> Self {
        self.locators.push(Box::new(locator));
        self
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl SourceLocator for AggregateSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedSource>> {
        identifier.validate()?;

        for (index, locator) in self.locators.iter().enumerate() {
            trace!("Trying locator #{} for {}", index, identifier);
            if let Some(source) = locator.locate(identifier)? {
                debug!("Locator #{} answered {}", index, identifier);
                return Ok(Some(source));
            }
        }

        debug!("No locator answered {}", identifier);
        Ok(None)
    }
}

impl std::fmt::Debug for AggregateSourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateSourceLocator")
            .field("locators", &self.locators.len())
            .finish()
    }
}
