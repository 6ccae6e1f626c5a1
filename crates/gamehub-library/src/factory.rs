//! Platform factories and the registry of platform kinds

use crate::{Platform, PlatformRow};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Constructs platforms of one variant.
///
/// New platforms plug in by implementing this trait (plus a scanner) and
/// registering the factory under its [`PlatformFactory::platform_name`].
pub trait PlatformFactory: Send + Sync {
    /// Stable variant name, also the registry key and the database name
    fn platform_name(&self) -> &str;

    /// An enabled, not yet persisted instance
    fn create_default(&self) -> Platform;

    /// Rebuild an instance from its database row
    fn create_from_database(&self, row: &PlatformRow) -> Platform;
}

/// Maps platform names to their factories
#[derive(Default, Clone)]
pub struct PlatformRegistry {
    factories: BTreeMap<String, Arc<dyn PlatformFactory>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one with the same name
    pub fn register(&mut self, factory: Arc<dyn PlatformFactory>) {
        let name = factory.platform_name().to_string();
        if self.factories.insert(name.clone(), factory).is_some() {
            tracing::debug!("Replaced platform factory {}", name);
        }
    }

    pub fn factory(&self, name: &str) -> Option<&Arc<dyn PlatformFactory>> {
        self.factories.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// One platform per registered factory.
    ///
    /// A factory whose name matches a row is rebuilt from that row; the rest
    /// get a default, unpersisted instance. Rows without a factory are skipped.
    pub fn enumerate_platforms(&self, rows: &[PlatformRow]) -> Vec<Platform> {
        for row in rows {
            if !self.factories.contains_key(&row.name) {
                tracing::warn!(
                    "No factory registered for persisted platform {} ({})",
                    row.name,
                    row.id
                );
            }
        }

        self.factories
            .iter()
            .map(|(name, factory)| match rows.iter().find(|row| &row.name == name) {
                Some(row) => factory.create_from_database(row),
                None => factory.create_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFactory;
    use std::path::PathBuf;

    fn registry() -> PlatformRegistry {
        let mut registry = PlatformRegistry::new();
        registry.register(Arc::new(MockFactory::new("Beta")));
        registry.register(Arc::new(MockFactory::new("Alpha")));
        registry
    }

    #[test]
    fn test_names_sorted() {
        assert_eq!(registry().names(), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = registry();
        registry.register(Arc::new(MockFactory::new("Alpha")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_create_default_contract() {
        let registry = registry();
        for name in registry.names() {
            let factory = registry.factory(name).unwrap();
            let platform = factory.create_default();
            assert!(platform.id() < 0);
            assert!(platform.is_enabled());
            assert_eq!(platform.name(), factory.platform_name());
        }
    }

    #[test]
    fn test_enumerate_uses_rows() {
        let rows = vec![
            PlatformRow {
                id: 7,
                name: "Beta".into(),
                description: "persisted".into(),
                path: PathBuf::from("/beta"),
                is_active: false,
            },
            PlatformRow {
                id: 8,
                name: "Gone".into(),
                description: String::new(),
                path: PathBuf::new(),
                is_active: true,
            },
        ];

        let platforms = registry().enumerate_platforms(&rows);
        assert_eq!(platforms.len(), 2);

        let alpha = &platforms[0];
        assert_eq!(alpha.name(), "Alpha");
        assert_eq!(alpha.id(), Platform::UNPERSISTED_ID);

        let beta = &platforms[1];
        assert_eq!(beta.id(), 7);
        assert!(!beta.is_enabled());
        assert_eq!(beta.path(), PathBuf::from("/beta").as_path());
    }
}
