use std::path::{Path, PathBuf};

use log::debug;

use crate::{Identifier, LocatedSource, LocatorError, Result, SourceLocator};

/// Serves the contents of a single source file for every identifier.
///
/// The file is read on each lookup, so edits are picked up without rebuilding
/// the locator. Since it never misses, put it last in an
/// [`AggregateSourceLocator`](crate::AggregateSourceLocator).
#[derive(Debug, Clone)]
pub struct SingleFileSourceLocator {
    path: PathBuf,
}

impl SingleFileSourceLocator {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(LocatorError::InvalidFileLocation(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceLocator for SingleFileSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedSource>> {
        identifier.validate()?;

        let text = std::fs::read_to_string(&self.path).map_err(|source| LocatorError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!("Read {} bytes from {:?} for {}", text.len(), self.path, identifier);
        Ok(Some(LocatedSource::from_file(text, self.path.clone())))
    }
}
