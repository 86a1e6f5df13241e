//! Tree-sitter adapters for 9 languages behind one `LanguageAdapter` trait.
//!
//! Each language supplies a syntax profile (how its grammar spells
//! functions, branches, raises and member access). One shared extractor
//! turns any profile's view of a tree into the unified model.

mod body;
pub mod error_tolerant;
mod extract;
pub mod languages;
mod macros;
mod profile;
pub mod registry;
pub mod traits;

pub use languages::{
    CAdapter, CSharpAdapter, CppAdapter, GoAdapter, JavaAdapter, JavaScriptAdapter, PythonAdapter,
    RustAdapter, TypeScriptAdapter,
};
pub use registry::AdapterRegistry;
pub use traits::LanguageAdapter;
