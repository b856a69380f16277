use std::collections::HashMap;

use pyrite_types::LiveType;

/// Read-only view of the types defined in a running environment.
pub trait LiveEnvironment: Send + Sync {
    /// Look up a class, interface or trait by its exact, fully qualified name.
    fn find_type(&self, name: &str) -> Option<LiveType>;
}

impl<E: LiveEnvironment + ?Sized> LiveEnvironment for &E {
    fn find_type(&self, name: &str) -> Option<LiveType> {
        (**self).find_type(name)
    }
}

impl<E: LiveEnvironment + ?Sized> LiveEnvironment for std::sync::Arc<E> {
    fn find_type(&self, name: &str) -> Option<LiveType> {
        (**self).find_type(name)
    }
}

/// An in-memory [`LiveEnvironment`], keyed by exact type name.
///
/// Useful for embedding a snapshot of another process's loaded types, which
/// can be captured as a JSON array of [`LiveType`] values.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, LiveType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a JSON array of live types.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let types: Vec<LiveType> = serde_json::from_str(json)?;
        Ok(types.into_iter().collect())
    }

    /// Register a type, replacing any previous type with the same name.
    pub fn register(&mut self, live_type: LiveType) {
        self.types.insert(live_type.name.clone(), live_type);
    }

    pub fn with(mut self, live_type: LiveType) -> Self {
        self.register(live_type);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<LiveType> for TypeRegistry {
    fn from_iter<I: IntoIterator<Item = LiveType>>(iter: I) -> Self {
        let mut registry = Self::new();
        for live_type in iter {
            registry.register(live_type);
        }
        registry
    }
}

impl LiveEnvironment for TypeRegistry {
    fn find_type(&self, name: &str) -> Option<LiveType> {
        self.types.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_types::LiveTypeKind;

    #[test]
    fn test_lookup_is_exact() {
        let registry = TypeRegistry::new().with(LiveType::new("App\\Foo", LiveTypeKind::Class));

        assert!(registry.find_type("App\\Foo").is_some());
        assert!(registry.find_type("app\\foo").is_none());
        assert!(registry.find_type("Foo").is_none());
    }

    #[test]
    fn test_from_json_snapshot() {
        let registry = TypeRegistry::from_json(
            r#"[
                { "name": "Countable", "kind": "interface" },
                { "name": "App\\Greets", "kind": "trait", "file_name": "/app/Greets.php" }
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        let greets = registry.find_type("App\\Greets").unwrap();
        assert_eq!(greets.kind, LiveTypeKind::Trait);
        assert!(greets.file_name.is_some());
        assert!(TypeRegistry::from_json("{").is_err());
    }
}
