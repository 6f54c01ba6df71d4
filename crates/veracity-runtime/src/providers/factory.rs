//! Provider factory pattern for building adapters from configuration.
//!
//! Each provider type registers a factory under its `type` string. The
//! registry turns the ordered `aggregation.providers` list into adapters,
//! preserving order, so config order is precedence order.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//! let adapters = registry.build_adapters(&config.aggregation.providers)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ConfigError, ProviderConfig};

use super::{EvidenceProvider, ProviderAdapter};

/// Factory for creating evidence providers from configuration.
///
/// Factories must not fail on missing credentials: the provider is built
/// anyway and reports a skip reason at fetch time.
pub trait ProviderFactory: Send + Sync {
    /// Unique type identifier, matched against `ProviderConfig::kind`.
    fn provider_type(&self) -> &'static str;

    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn EvidenceProvider>, ConfigError>;

    /// Validate configuration without creating a provider.
    fn validate_config(&self, _config: &ProviderConfig) -> Result<(), ConfigError> {
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Evidence provider"
    }
}

/// Registry of available provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any with the same type.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    /// Build one adapter. Disabled providers are built too, so they keep
    /// their place in the order and report `Empty`.
    pub fn create(&self, config: &ProviderConfig) -> Result<ProviderAdapter, ConfigError> {
        let factory = self.factory(&config.kind)?;
        factory.validate_config(config)?;
        let provider = factory.create(config)?;

        let adapter = ProviderAdapter::new(config.id.clone(), provider, config.timeout);
        Ok(if config.enabled { adapter } else { adapter.disabled() })
    }

    /// Build adapters for every configured provider, in order.
    pub fn build_adapters(&self, configs: &[ProviderConfig]) -> Result<Vec<ProviderAdapter>, ConfigError> {
        configs.iter().map(|c| self.create(c)).collect()
    }

    /// Validate one provider config without building it.
    pub fn validate(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        self.factory(&config.kind)?.validate_config(config)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    pub fn description(&self, provider_type: &str) -> Option<&'static str> {
        self.factories.get(provider_type).map(|f| f.description())
    }

    fn factory(&self, kind: &str) -> Result<&Arc<dyn ProviderFactory>, ConfigError> {
        self.factories
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownProviderType {
                kind: kind.to_string(),
                available: self.available_types().into_iter().map(String::from).collect(),
            })
    }

    /// Registry with every built-in provider compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "google-news")]
        registry.register(Arc::new(super::GoogleNewsRssFactory));
        #[cfg(feature = "newsapi")]
        registry.register(Arc::new(super::NewsApiFactory));
        #[cfg(feature = "serpapi")]
        registry.register(Arc::new(super::SerpApiFactory));

        registry
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use veracity_core::Article;

    struct MockProvider;

    #[async_trait]
    impl EvidenceProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn search(&self, _query: &str) -> Result<Vec<Article>, ProviderError> {
            Ok(vec![])
        }
    }

    struct MockProviderFactory;

    impl ProviderFactory for MockProviderFactory {
        fn provider_type(&self) -> &'static str {
            "mock"
        }

        fn create(&self, _config: &ProviderConfig) -> Result<Arc<dyn EvidenceProvider>, ConfigError> {
            Ok(Arc::new(MockProvider))
        }

        fn validate_config(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
            if config.options["broken"].as_bool() == Some(true) {
                return Err(ConfigError::Invalid("broken".to_string()));
            }
            Ok(())
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProviderFactory));
        registry
    }

    #[test]
    fn test_build_adapters_preserves_order() {
        let configs = vec![
            ProviderConfig::new("second-first", "mock"),
            ProviderConfig::new("alpha", "mock"),
        ];

        let adapters = registry().build_adapters(&configs).unwrap();
        let ids: Vec<_> = adapters.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["second-first", "alpha"]);
    }

    #[test]
    fn test_disabled_config_builds_disabled_adapter() {
        let mut config = ProviderConfig::new("m", "mock");
        config.enabled = false;

        let adapter = registry().create(&config).unwrap();
        assert!(!adapter.is_enabled());
    }

    #[test]
    fn test_unknown_provider_type() {
        let result = registry().create(&ProviderConfig::new("x", "carrier-pigeon"));

        match result {
            Err(ConfigError::UnknownProviderType { kind, available }) => {
                assert_eq!(kind, "carrier-pigeon");
                assert_eq!(available, vec!["mock".to_string()]);
            }
            other => panic!("Expected UnknownProviderType, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_runs_before_create() {
        let mut config = ProviderConfig::new("m", "mock");
        config.options = serde_json::json!({ "broken": true });

        assert!(registry().validate(&config).is_err());
        assert!(registry().create(&config).is_err());
    }

    #[test]
    fn test_with_defaults_registers_builtins() {
        let registry = ProviderRegistry::with_defaults();
        #[cfg(feature = "google-news")]
        assert!(registry.has_provider("google-news-rss"));
        #[cfg(feature = "newsapi")]
        assert!(registry.has_provider("newsapi"));
        #[cfg(feature = "serpapi")]
        assert!(registry.has_provider("serpapi"));
        let _ = registry;
    }
}
