//! Language detection from file extension, with content sniffing for
//! ambiguous headers and extensionless scripts.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported programming languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    Java,
    JavaScript,
    TypeScript,
    CSharp,
    Go,
    Rust,
    C,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::Python,
        Language::Java,
        Language::JavaScript,
        Language::TypeScript,
        Language::CSharp,
        Language::Go,
        Language::Rust,
        Language::C,
        Language::Cpp,
    ];

    /// Detect language from a file extension string.
    /// `h` is deliberately absent: it needs [`Language::detect`].
    pub fn from_extension(ext: Option<&str>) -> Option<Language> {
        match ext?.to_ascii_lowercase().as_str() {
            "py" | "pyi" => Some(Language::Python),
            "java" => Some(Language::Java),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "cs" => Some(Language::CSharp),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            "c" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "c++" | "hpp" | "hxx" | "hh" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// Detect the language of `path`, consulting `content` when the
    /// extension alone is not decisive.
    pub fn detect(path: &Path, content: &[u8]) -> Option<Language> {
        let ext = path.extension().and_then(|e| e.to_str());
        if let Some(lang) = Self::from_extension(ext) {
            return Some(lang);
        }
        match ext.map(str::to_ascii_lowercase).as_deref() {
            Some("h") => Some(sniff_header(content)),
            None => sniff_shebang(content),
            _ => None,
        }
    }

    /// Resolve a configuration name such as `python`, `c#` or `c++`.
    pub fn from_name(name: &str) -> Option<Language> {
        match name.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "java" => Some(Language::Java),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "csharp" | "c#" | "cs" => Some(Language::CSharp),
            "go" | "golang" => Some(Language::Go),
            "rust" | "rs" => Some(Language::Rust),
            "c" => Some(Language::C),
            "cpp" | "c++" | "cxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// Returns all file extensions associated with this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::Java => &["java"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::CSharp => &["cs"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "c++", "hpp", "hxx", "hh", "h"],
        }
    }

    /// Stable identifier used in configuration and output.
    pub fn id(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Returns the display name of the language.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Java => "Java",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::CSharp => "C#",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::C => "C",
            Language::Cpp => "C++",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const CPP_HEADER_MARKERS: &[&str] = &[
    "class ",
    "namespace ",
    "template<",
    "template <",
    "std::",
    "public:",
    "private:",
    "protected:",
    "virtual ",
    "#include <iostream>",
    "#include <string>",
    "#include <vector>",
];

fn sniff_header(content: &[u8]) -> Language {
    let text = String::from_utf8_lossy(content);
    if CPP_HEADER_MARKERS.iter().any(|m| text.contains(m)) || text.contains("::") {
        Language::Cpp
    } else {
        Language::C
    }
}

fn sniff_shebang(content: &[u8]) -> Option<Language> {
    let first_line = content.split(|b| *b == b'\n').next()?;
    let line = std::str::from_utf8(first_line).ok()?;
    if !line.starts_with("#!") {
        return None;
    }
    if line.contains("python") {
        Some(Language::Python)
    } else if line.contains("node") || line.contains("deno") {
        Some(Language::JavaScript)
    } else if line.contains("ts-node") {
        Some(Language::TypeScript)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table() {
        assert_eq!(Language::from_extension(Some("py")), Some(Language::Python));
        assert_eq!(Language::from_extension(Some("c++")), Some(Language::Cpp));
        assert_eq!(Language::from_extension(Some("CC")), Some(Language::Cpp));
        assert_eq!(Language::from_extension(Some("tsx")), Some(Language::TypeScript));
        assert_eq!(Language::from_extension(Some("h")), None);
        assert_eq!(Language::from_extension(Some("rb")), None);
        assert_eq!(Language::from_extension(None), None);
    }

    #[test]
    fn header_sniffing() {
        let cpp = b"#pragma once\nnamespace geo { class Point {}; }\n";
        let c = b"#ifndef MATH_H\nint add(int a, int b);\n#endif\n";
        assert_eq!(Language::detect(Path::new("geo.h"), cpp), Some(Language::Cpp));
        assert_eq!(Language::detect(Path::new("math.h"), c), Some(Language::C));
    }

    #[test]
    fn shebang_sniffing() {
        let script = b"#!/usr/bin/env python3\ndef main():\n    pass\n";
        assert_eq!(Language::detect(Path::new("tool"), script), Some(Language::Python));
        assert_eq!(Language::detect(Path::new("README"), b"hello"), None);
    }

    #[test]
    fn names_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_name(lang.id()), Some(lang));
        }
        assert_eq!(Language::from_name("C#"), Some(Language::CSharp));
        assert_eq!(Language::from_name("cobol"), None);
    }
}
