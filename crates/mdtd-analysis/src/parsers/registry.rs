//! Adapter registry: maps each language to the adapter that parses it.

use mdtd_core::errors::AdapterError;
use mdtd_core::types::collections::FxHashMap;

use super::languages::{
    CAdapter, CSharpAdapter, CppAdapter, GoAdapter, JavaAdapter, JavaScriptAdapter, PythonAdapter,
    RustAdapter, TypeScriptAdapter,
};
use super::traits::LanguageAdapter;
use crate::scanner::Language;

/// Language-to-adapter dispatch table. New languages are added by
/// registering an adapter; nothing downstream changes.
pub struct AdapterRegistry {
    adapters: FxHashMap<Language, Box<dyn LanguageAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            adapters: FxHashMap::default(),
        }
    }

    /// A registry with every built-in adapter.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PythonAdapter);
        registry.register(JavaAdapter);
        registry.register(JavaScriptAdapter);
        registry.register(TypeScriptAdapter);
        registry.register(CSharpAdapter);
        registry.register(GoAdapter);
        registry.register(RustAdapter);
        registry.register(CAdapter);
        registry.register(CppAdapter);
        registry
    }

    /// Register `adapter`, replacing any adapter for the same language.
    pub fn register(&mut self, adapter: impl LanguageAdapter + 'static) {
        self.adapters.insert(adapter.language(), Box::new(adapter));
    }

    /// Remove the adapter for `language`, if any.
    pub fn unregister(&mut self, language: Language) {
        self.adapters.remove(&language);
    }

    pub fn get(&self, language: Language) -> Result<&dyn LanguageAdapter, AdapterError> {
        self.adapters
            .get(&language)
            .map(|a| a.as_ref())
            .ok_or_else(|| AdapterError::Unsupported {
                language: language.name().to_string(),
            })
    }

    pub fn supports(&self, language: Language) -> bool {
        self.adapters.contains_key(&language)
    }

    /// Registered languages in stable order.
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self.adapters.keys().copied().collect();
        langs.sort();
        langs
    }
}
