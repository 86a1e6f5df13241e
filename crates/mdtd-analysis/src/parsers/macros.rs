//! `define_adapter!` macro for reducing boilerplate per language.

/// Define an adapter struct whose `LanguageAdapter::parse` runs the shared
/// extractor over the struct's `SyntaxProfile` impl.
///
/// Usage:
/// ```ignore
/// define_adapter!(GoAdapter, Language::Go);
/// ```
macro_rules! define_adapter {
    ($name:ident, $language:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self
            }
        }

        impl $crate::parsers::traits::LanguageAdapter for $name {
            fn language(&self) -> $crate::scanner::Language {
                $language
            }

            fn extensions(&self) -> &[&str] {
                $language.extensions()
            }

            fn parse(
                &self,
                path: &str,
                source: &str,
            ) -> Result<$crate::model::SourceUnit, $crate::model::ParseFailure> {
                $crate::parsers::extract::extract(self, path, source)
            }
        }
    };
}

pub(crate) use define_adapter;
