use log::debug;
use pyrite_types::LiveType;

use crate::{
    DeclarationGenerator, DefaultDeclarationGenerator, Identifier, LiveEnvironment, LocatedSource,
    Result, SOURCE_PREAMBLE, SourceLocator,
};

/// Fallback locator for classes that only exist in a running environment.
///
/// When a class, interface or trait with the requested name is registered in
/// the environment, its declaration is regenerated from the introspected
/// shape and returned as [`OriginKind::Synthesized`](crate::OriginKind)
/// source. Types without an origin file are skipped, so a type that was
/// itself synthesized is never synthesized again.
pub struct EvaledSourceLocator<E> {
    environment: E,
    generator: Box<dyn DeclarationGenerator>,
}

impl<E: LiveEnvironment> EvaledSourceLocator<E> {
    pub fn new(environment: E) -> Self {
        Self {
            environment,
            generator: Box::new(DefaultDeclarationGenerator),
        }
    }

    /// Use a different declaration generator.
    pub fn with_generator(mut self, generator: impl DeclarationGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    fn live_type_for(&self, identifier: &Identifier) -> Option<LiveType> {
        if !identifier.is_class() {
            return None;
        }

        let name = identifier.normalized_name();
        let Some(live_type) = self.environment.find_type(name) else {
            debug!("{} is not defined in the live environment", identifier);
            return None;
        };

        if live_type.file_name.is_none() {
            debug!("{} has no origin file, not synthesizing", identifier);
            return None;
        }

        Some(live_type)
    }
}

impl<E: LiveEnvironment> SourceLocator for EvaledSourceLocator<E> {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedSource>> {
        identifier.validate()?;

        let Some(live_type) = self.live_type_for(identifier) else {
            return Ok(None);
        };

        debug!("Synthesizing source for {}", identifier);
        let declaration = self.generator.generate(&live_type);
        Ok(Some(LocatedSource::synthesized(format!(
            "{}{}",
            SOURCE_PREAMBLE, declaration
        ))))
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for EvaledSourceLocator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaledSourceLocator")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
