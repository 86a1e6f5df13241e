//! Per-language adapters.

mod c_family;
mod csharp;
mod go;
mod java;
mod javascript;
mod python;
mod rust_lang;

pub use c_family::{CAdapter, CppAdapter};
pub use csharp::CSharpAdapter;
pub use go::GoAdapter;
pub use java::JavaAdapter;
pub use javascript::{JavaScriptAdapter, TypeScriptAdapter};
pub use python::PythonAdapter;
pub use rust_lang::RustAdapter;
